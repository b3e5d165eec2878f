//! Minimal metrics registry for the gateway.
//!
//! Counter and histogram types with dynamic labels backed by `DashMap`.
//! Labels are flattened into sorted key vectors for deterministic ordering.
//! Histogram buckets are fixed in microseconds to avoid floating point math.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn label_key(labels: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut key: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn label_str(key: &[(String, String)]) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value for an exact label set (0 when never incremented).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{{{}}} {}", name, label_str(r.key()), val);
        }
    }
}

// 100us, 500us, 1ms, 5ms, 10ms, 50ms, 100ms, 500ms, 1s
const BUCKETS_MICROS: [u64; 9] = [100, 500, 1_000, 5_000, 10_000, 50_000, 100_000, 500_000, 1_000_000];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; 9],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<Vec<(String, String)>, AtomicHistogram>,
}

impl HistogramVec {
    /// Observe a duration and increment cumulative buckets (microsecond scale).
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self
            .map
            .entry(label_key(labels))
            .or_insert_with(AtomicHistogram::default);
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(micros, Ordering::Relaxed);

        for (i, &b) in BUCKETS_MICROS.iter().enumerate() {
            if micros <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Render in Prometheus text exposition format (unit: microseconds).
    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} histogram", name);
        for r in self.map.iter() {
            let hist = r.value();
            let labels = label_str(r.key());
            let prefix = if labels.is_empty() { String::new() } else { format!("{},", labels) };

            for (i, &le) in BUCKETS_MICROS.iter().enumerate() {
                let count = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, count);
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, count);

            let sum = hist.sum.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_sum{{{}}} {}", name, labels, sum);
            let _ = writeln!(out, "{}_count{{{}}} {}", name, labels, count);
        }
    }
}

#[derive(Default)]
pub struct GatewayMetrics {
    /// Routing decisions, label `target`.
    pub requests: CounterVec,
    /// Every response returned to the client, served or handed off, label `status`.
    pub responses: CounterVec,
    /// WebSocket-over-HTTP events answered, label `kind`.
    pub ws_events: CounterVec,
    /// Protocol/frame/body rejections, label `code`.
    pub rejections: CounterVec,
    /// Hand-off upstream failures, label `target`.
    pub handoff_failures: CounterVec,
    pub request_duration: HistogramVec, // In Microseconds
}

impl GatewayMetrics {
    /// Render all registered metrics.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.requests.render("gripwire_requests_total", &mut out);
        self.responses.render("gripwire_responses_total", &mut out);
        self.ws_events.render("gripwire_ws_events_total", &mut out);
        self.rejections.render("gripwire_rejections_total", &mut out);
        self.handoff_failures.render("gripwire_handoff_failures_total", &mut out);
        self.request_duration.render("gripwire_request_duration_micros", &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_keyed_by_sorted_labels() {
        let m = GatewayMetrics::default();
        m.requests.inc(&[("target", "serve-test"), ("mode", "sse")]);
        m.requests.inc(&[("mode", "sse"), ("target", "serve-test")]);
        assert_eq!(m.requests.get(&[("target", "serve-test"), ("mode", "sse")]), 2);
        assert_eq!(m.requests.get(&[("target", "handoff-origin")]), 0);

        let text = m.render();
        assert!(text.contains("gripwire_requests_total{mode=\"sse\",target=\"serve-test\"} 2"));
    }

    #[test]
    fn histogram_buckets_are_cumulative() {
        let m = GatewayMetrics::default();
        m.request_duration
            .observe(&[("target", "handoff-self")], Duration::from_micros(700));

        let text = m.render();
        assert!(text.contains("gripwire_request_duration_micros_bucket{target=\"handoff-self\",le=\"500\"} 0"));
        assert!(text.contains("gripwire_request_duration_micros_bucket{target=\"handoff-self\",le=\"1000\"} 1"));
        assert!(text.contains("gripwire_request_duration_micros_count{target=\"handoff-self\"} 1"));
    }

    #[test]
    fn oversized_duration_saturates() {
        let m = GatewayMetrics::default();
        m.request_duration.observe(&[("target", "serve-test")], Duration::MAX);

        let text = m.render();
        assert!(text.contains(&format!("gripwire_request_duration_micros_sum{{target=\"serve-test\"}} {}", u64::MAX)));
        assert!(text.contains("gripwire_request_duration_micros_bucket{target=\"serve-test\",le=\"1000000\"} 0"));
    }
}
