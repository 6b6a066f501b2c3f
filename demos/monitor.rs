use std::env;

use ccm15::{Ccm15ClientBuilder, Config};

#[tokio::main]
async fn main() -> ccm15::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(arg) if arg.ends_with(".yaml") || arg.ends_with(".yml") => Config::load(arg)?,
        Some(host) => Config {
            host: host.clone(),
            ..Config::default()
        },
        None => Config::default(),
    };

    let mut client = Ccm15ClientBuilder::from_config(&config)
        .on_event(|event| {
            println!("{event:?}");
        })
        .on_snapshot(|t| {
            let status = t.status();
            let unit = t.temperature_unit().symbol();
            println!(
                "[{}] {}{unit} -> {}{unit} | mode: {} | fan: {}{}{}",
                t.name(),
                t.current_temperature(),
                t.target_temperature(),
                t.hvac_mode(),
                t.fan_mode(),
                if status.locked { " | LOCKED" } else { "" },
                if status.has_error() {
                    format!(" | ERR {}", status.error_code)
                } else {
                    String::new()
                },
            );
        })
        .build()?;

    println!("Polling {}:{} every {}s...", config.host, config.port, config.scan_interval);
    let mut interval = tokio::time::interval(config.scan_interval());
    loop {
        interval.tick().await;
        client.poll().await;
    }
}
