use std::net::IpAddr;

use anyhow::Context;
use ant_colony::Coordinator;
use ant_colony_core::config::ColonyConfig;
use ant_colony_net::{PortPlan, TransportKind};

fn usage() -> ! {
    eprintln!("Usage: coordinator [transport] [bind_ip] [port] [workers] [ants] [iterations]");
    eprintln!();
    eprintln!("  transport   stream | dual-stream | datagram | framed (default stream)");
    eprintln!("  bind_ip     address to listen on (default 0.0.0.0)");
    eprintln!("  port        base port (default 8081)");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  coordinator stream 0.0.0.0 8081 2 20 100");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "-h" || a == "--help") || args.len() > 6 {
        usage();
    }

    let transport: TransportKind = args
        .first()
        .map_or("stream", String::as_str)
        .parse()
        .map_err(anyhow::Error::msg)?;
    let ip: IpAddr = args
        .get(1)
        .map_or("0.0.0.0", String::as_str)
        .parse()
        .context("invalid bind address")?;
    let base: u16 = args
        .get(2)
        .map_or(Ok(8081), |p| p.parse())
        .context("invalid port")?;

    let mut config = ColonyConfig::default();
    if let Some(workers) = args.get(3) {
        config.num_workers = workers.parse().context("invalid worker count")?;
    }
    if let Some(ants) = args.get(4) {
        config.max_ants = ants.parse().context("invalid ant count")?;
    }
    if let Some(iterations) = args.get(5) {
        config.max_iterations = iterations.parse().context("invalid iteration count")?;
    }

    let ports = PortPlan {
        base,
        ..PortPlan::default()
    };
    let outcome = Coordinator::new(config).run(transport, ip, ports).await?;

    println!("best value: {}", outcome.best_value);
    println!("best items: {:?}", outcome.best_items);
    println!(
        "startup {:?}, rounds {:?}, total {:?}",
        outcome.startup_time,
        outcome.round_time,
        outcome.total_time()
    );
    Ok(())
}
