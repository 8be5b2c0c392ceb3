// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Offline helper around the ingress rate limiter math: turns a target
//! rate into register fields without touching any hardware, and encodes
//! RMU request payloads for inspection.

use clap::{Parser, Subcommand};
use umsd_if::switch::pirl::{custom_setup_sr2c, PirlCountMode};
use umsd_if::RmuMsg;

#[derive(Parser)]
#[command(about = "Compute ingress rate limiter register fields")]
struct CmdArgs {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Compute single-rate two-color bucket parameters.
    Sr2c {
        /// Target rate in kbps (byte mode) or frames per second (frame mode).
        rate: u32,
        /// Committed burst size in bytes (byte mode) or frames (frame mode).
        burst: u32,
        /// Count frames instead of bytes.
        #[arg(long)]
        frames: bool,
    },
    /// Encode an RMU request payload and print it as hex.
    Rmu {
        #[command(subcommand)]
        msg: RmuCmd,
    },
}

#[derive(Subcommand)]
enum RmuCmd {
    GetId,
    DumpAtu {
        #[arg(long, default_value_t = 0)]
        continue_code: u16,
    },
    DumpMib {
        port: u8,
        #[arg(long)]
        flush: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CmdArgs::parse();

    match args.cmd {
        Cmd::Sr2c {
            rate,
            burst,
            frames,
        } => {
            let mode = if frames {
                PirlCountMode::Frame
            } else {
                PirlCountMode::Byte
            };
            let fields = custom_setup_sr2c(rate, burst, mode)?;
            println!("{}", serde_json::to_string_pretty(&fields)?);
        }
        Cmd::Rmu { msg } => {
            let msg = match msg {
                RmuCmd::GetId => RmuMsg::GetId,
                RmuCmd::DumpAtu { continue_code } => RmuMsg::DumpAtu { continue_code },
                RmuCmd::DumpMib { port, flush } => RmuMsg::DumpMib { port, flush },
            };
            let payload = msg.encode()?;
            let hex: Vec<String> = payload.iter().map(|b| format!("{b:02x}")).collect();
            println!("{}", hex.join(" "));
        }
    }

    Ok(())
}
