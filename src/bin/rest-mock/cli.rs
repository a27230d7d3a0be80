//! Command-line interface definitions for the REST mock server.

use std::net::IpAddr;

use clap::Parser;

/// Command-line arguments for the REST mock server.
#[derive(Debug, Parser)]
#[command(name = "rest-mock")]
#[command(author, version, about = "REST API mock serving an ordered queue of expected requests")]
pub struct Cli {
    /// Address to listen on
    pub address: IpAddr,

    /// Port to listen on
    pub port: u16,
}
