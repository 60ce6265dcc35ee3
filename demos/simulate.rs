//! # Example: simulate
//!
//! Synthetic-load demonstration: a producer issues probes and claims against
//! a small team at random 1–5 ms intervals, then the run is audited offline.
//!
//! Demonstrates how to:
//! - Build a [`TeamManager`] over a [`TokioRunner`].
//! - Drive it with a mix of probes and claims (one claim per five probes).
//! - Collect the resolved responses and run the [`Audit`] over them.
//!
//! ## Flow
//! ```text
//! for each request {
//!   sleep(random 1..=5 ms)
//!   claim every 5th request, probe otherwise
//! }
//! join all responses ──► sort by time ──► Audit::run ──► console stats
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example simulate
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;

use crewgate::audit::Audit;
use crewgate::{
    EngineConfig, EpochMillis, OutcomeKind, QuotaPolicy, Request, Response, TeamManager,
    TokioRunner,
};

const NUM_REQUESTS: usize = 1200;
const CLAIMS_PER_PROBE: usize = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = EngineConfig {
        team_size: 3,
        job_duration: Duration::from_millis(50),
        quota: QuotaPolicy {
            max_claims: 5,
            window: Duration::from_millis(600),
        },
        bus_capacity: 1024,
    };
    let manager = TeamManager::new(&cfg, Arc::new(TokioRunner::new()))?;

    // With `--features logging`, echo every engine event to stdout.
    #[cfg(feature = "logging")]
    let _listener = manager.spawn_listener(vec![
        Arc::new(crewgate::LogWriter) as Arc<dyn crewgate::EventSink>
    ]);

    // All timestamps are milliseconds since the run started.
    let epoch = Instant::now();
    let now = move || -> EpochMillis { epoch.elapsed().as_millis() as u64 };

    let mut requests = Vec::with_capacity(NUM_REQUESTS);
    for idx in 0..NUM_REQUESTS {
        let jitter = rand::thread_rng().gen_range(1..=5);
        tokio::time::sleep(Duration::from_millis(jitter)).await;

        let req = Request::new();
        let at = now();
        if idx % CLAIMS_PER_PROBE == 0 {
            if let Err(err) = manager.claim(at, &req) {
                eprintln!("[simulate] claim failed: {err}");
            }
        } else if let Err(err) = manager.probe(at, &req) {
            eprintln!("[simulate] probe failed: {err}");
        }
        requests.push(req);
    }

    let mut responses: Vec<Response> = Vec::with_capacity(requests.len());
    for req in &requests {
        responses.push(req.response().await.clone());
    }
    responses.sort();

    let report = Audit::new(&cfg).run(&responses);
    print_claim_stats(&responses);
    print_probe_stats(&responses);

    println!();
    println!("== audit ==");
    println!("no double-booking: {}", report.no_double_booking());
    println!("quota respected:   {}", report.quota_respected());
    println!(
        "missed claims:     {} (avg excess wait {} ms)",
        report.missed_claims.total_missed, report.missed_claims.avg_excess_wait_ms
    );
    println!(
        "missed probes:     {} (avg excess wait {} ms)",
        report.missed_probes.total_missed, report.missed_probes.avg_excess_wait_ms
    );

    manager.shutdown().await;
    Ok(())
}

fn print_claim_stats(responses: &[Response]) {
    let claimed: Vec<&Response> = responses
        .iter()
        .filter(|r| r.kind == OutcomeKind::Claimed)
        .collect();
    let rejected = responses
        .iter()
        .filter(|r| r.kind == OutcomeKind::ClaimRejected)
        .count();

    println!("== claim stats ==");
    println!("total claims:    {}", claimed.len() + rejected);
    println!("served:          {}", claimed.len());
    println!("rejected:        {rejected}");

    let gaps: Vec<u64> = claimed
        .windows(2)
        .map(|pair| pair[1].at.saturating_sub(pair[0].at))
        .collect();
    if let (Some(min), Some(max)) = (gaps.iter().min(), gaps.iter().max()) {
        let avg = gaps.iter().sum::<u64>() / gaps.len() as u64;
        println!("gap between served claims: min={min} ms max={max} ms avg={avg} ms");
    }
}

fn print_probe_stats(responses: &[Response]) {
    let accepted = responses
        .iter()
        .filter(|r| r.kind == OutcomeKind::ProbeAccepted)
        .count();
    let rejected = responses
        .iter()
        .filter(|r| r.kind == OutcomeKind::ProbeRejected)
        .count();

    println!();
    println!("== probe stats ==");
    println!("total probes:    {}", accepted + rejected);
    println!("worker available: {accepted}");
    println!("none available:   {rejected}");
}
