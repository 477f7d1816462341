//! Gateway statistics.

use std::time::Duration;

use dispatcher::MetricsSnapshot;

/// Statistics from a relay run
#[derive(Debug, Clone, Default)]
pub struct GatewayStats {
    /// Raddecs read from the input (or generated)
    pub raddecs_received: u64,

    /// Derived events read from the derived input
    pub derived_received: u64,

    /// Input lines that failed to parse
    pub parse_errors: u64,

    /// Failures that reached the error sink
    pub errors_recorded: u64,

    /// Raddecs dropped because the aggregator output was backed up
    pub aggregator_dropped: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Per-target counters, in configuration order
    pub targets: Vec<(String, MetricsSnapshot)>,
}

impl GatewayStats {
    /// Raddecs per second
    pub fn rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.raddecs_received as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn total_failed(&self) -> u64 {
        self.targets
            .iter()
            .map(|(_, m)| m.failed + m.encode_failed)
            .sum()
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Relay Statistics                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Raddecs received: {}", self.raddecs_received);
        println!("   ├─ Derived events received: {}", self.derived_received);
        println!("   ├─ Rate: {:.2}/s", self.rate());
        println!("   ├─ Parse errors: {}", self.parse_errors);
        println!("   ├─ Aggregator drops: {}", self.aggregator_dropped);
        println!("   └─ Errors recorded: {}", self.errors_recorded);

        if !self.targets.is_empty() {
            println!("\nTargets ({})", self.targets.len());
            for (i, (name, m)) in self.targets.iter().enumerate() {
                let prefix = if i == self.targets.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: attempted {}, delivered {}, failed {}, encode failed {}, skipped {}",
                    prefix, name, m.attempted, m.delivered, m.failed, m.encode_failed, m.skipped
                );
            }
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_and_failures() {
        let stats = GatewayStats {
            raddecs_received: 50,
            duration: Duration::from_secs(10),
            targets: vec![
                (
                    "raddec_targets[0] udp://a:50001".into(),
                    MetricsSnapshot {
                        failed: 2,
                        ..Default::default()
                    },
                ),
                (
                    "raddec_targets[1] http://b:80/raddecs".into(),
                    MetricsSnapshot {
                        failed: 1,
                        encode_failed: 1,
                        ..Default::default()
                    },
                ),
            ],
            ..Default::default()
        };
        assert_eq!(stats.rate(), 5.0);
        assert_eq!(stats.total_failed(), 4);
        assert_eq!(GatewayStats::default().rate(), 0.0);
    }
}
