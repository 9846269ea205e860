use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

macro_rules! counters {
    ($($field:ident => $inc:ident, $add:ident, $val:ident;)*) => {
        #[derive(Debug, Default)]
        pub struct MonitorMetrics {
            $($field: AtomicU64,)*
        }

        impl MonitorMetrics {
            pub fn new() -> Arc<Self> {
                Arc::new(Self::default())
            }

            $(
                pub fn $inc(&self) {
                    self.$field.fetch_add(1, Ordering::Relaxed);
                }

                pub fn $add(&self, n: u64) {
                    self.$field.fetch_add(n, Ordering::Relaxed);
                }

                pub fn $val(&self) -> u64 {
                    self.$field.load(Ordering::Relaxed)
                }
            )*
        }
    };
}

counters! {
    metric_ticks => inc_metric_ticks, add_metric_ticks, metric_ticks_val;
    samples_failed => inc_samples_failed, add_samples_failed, samples_failed_val;
    health_ticks => inc_health_ticks, add_health_ticks, health_ticks_val;
    unhealthy_checks => inc_unhealthy_checks, add_unhealthy_checks, unhealthy_checks_val;
    alerts_fired => inc_alerts_fired, add_alerts_fired, alerts_fired_val;
    critical_notifications => inc_critical_notifications, add_critical_notifications, critical_notifications_val;
    benchmarks_run => inc_benchmarks_run, add_benchmarks_run, benchmarks_run_val;
    benchmarks_failed => inc_benchmarks_failed, add_benchmarks_failed, benchmarks_failed_val;
    suggestions_emitted => inc_suggestions_emitted, add_suggestions_emitted, suggestions_emitted_val;
    notifications_sent => inc_notifications_sent, add_notifications_sent, notifications_sent_val;
    notifications_failed => inc_notifications_failed, add_notifications_failed, notifications_failed_val;
    store_errors => inc_store_errors, add_store_errors, store_errors_val;
}
