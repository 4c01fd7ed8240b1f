use std::net::IpAddr;

use anyhow::Context;
use ant_colony::run_worker;
use ant_colony_net::{PortPlan, TransportKind};

fn usage() -> ! {
    eprintln!("Usage: worker [transport] [coordinator_ip] [port] [index]");
    eprintln!();
    eprintln!("  transport       stream | dual-stream | datagram | framed (default stream)");
    eprintln!("  coordinator_ip  address the coordinator listens on (default 127.0.0.1)");
    eprintln!("  port            coordinator base port (default 8081)");
    eprintln!("  index           this worker's session index (default 0)");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  worker datagram 192.168.1.10 8081 1");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "-h" || a == "--help") || args.len() > 4 {
        usage();
    }

    let transport: TransportKind = args
        .first()
        .map_or("stream", String::as_str)
        .parse()
        .map_err(anyhow::Error::msg)?;
    let coordinator: IpAddr = args
        .get(1)
        .map_or("127.0.0.1", String::as_str)
        .parse()
        .context("invalid coordinator address")?;
    let base: u16 = args
        .get(2)
        .map_or(Ok(8081), |p| p.parse())
        .context("invalid port")?;
    let index: usize = args
        .get(3)
        .map_or(Ok(0), |i| i.parse())
        .context("invalid worker index")?;

    let ports = PortPlan {
        base,
        ..PortPlan::default()
    };
    let report = run_worker(transport, coordinator, ports, index).await?;

    println!(
        "served {} rounds, last round best {}",
        report.rounds_completed, report.last_best
    );
    Ok(())
}
