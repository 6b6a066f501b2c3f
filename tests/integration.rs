use std::sync::{Arc, Mutex};

use ccm15::{Ccm15Client, Event};

/// Run with: CCM15_HOST=192.168.1.200 cargo test --test integration -- --ignored
/// Requires a CCM-15 controller with at least one indoor unit attached.
#[tokio::test]
#[ignore]
async fn poll_live_controller() {
    let host = std::env::var("CCM15_HOST").unwrap_or_else(|_| "192.168.1.200".to_string());
    let events: Arc<Mutex<Vec<Event>>> = Arc::new(Mutex::new(vec![]));
    let events_clone = events.clone();

    let mut client = Ccm15Client::builder(host)
        .on_event(move |event| {
            events_clone.lock().unwrap().push(event.clone());
        })
        .build()
        .expect("client should build");

    let statuses = client.fetch_status().await.expect("status fetch failed");
    assert!(!statuses.is_empty(), "controller should report at least one zone");

    let updated = client.poll().await;
    assert_eq!(updated, statuses.len());

    {
        let captured = events.lock().unwrap();
        let discovered = captured
            .iter()
            .filter(|e| matches!(e, Event::ZoneDiscovered { .. }))
            .count();
        assert_eq!(discovered, statuses.len());
    }

    for thermostat in client.zones() {
        println!(
            "{}: {} {} {}{} (set {})",
            thermostat.name(),
            thermostat.hvac_mode(),
            thermostat.fan_mode(),
            thermostat.current_temperature(),
            thermostat.temperature_unit().symbol(),
            thermostat.target_temperature(),
        );
    }
}
