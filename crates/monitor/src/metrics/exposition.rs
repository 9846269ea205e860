use super::monitor_metrics::MonitorMetrics;

pub fn render_prometheus(m: &MonitorMetrics) -> String {
    let mut out = String::with_capacity(1024);

    write_counter(&mut out, "vigil_metric_ticks_total", m.metric_ticks_val());
    write_counter(&mut out, "vigil_samples_failed_total", m.samples_failed_val());
    write_counter(&mut out, "vigil_health_ticks_total", m.health_ticks_val());
    write_counter(&mut out, "vigil_unhealthy_checks_total", m.unhealthy_checks_val());
    write_counter(&mut out, "vigil_alerts_fired_total", m.alerts_fired_val());
    write_counter(&mut out, "vigil_critical_notifications_total", m.critical_notifications_val());
    write_counter(&mut out, "vigil_benchmarks_run_total", m.benchmarks_run_val());
    write_counter(&mut out, "vigil_benchmarks_failed_total", m.benchmarks_failed_val());
    write_counter(&mut out, "vigil_suggestions_emitted_total", m.suggestions_emitted_val());
    write_counter(&mut out, "vigil_notifications_sent_total", m.notifications_sent_val());
    write_counter(&mut out, "vigil_notifications_failed_total", m.notifications_failed_val());
    write_counter(&mut out, "vigil_store_errors_total", m.store_errors_val());

    out
}

fn write_counter(out: &mut String, name: &str, val: u64) {
    use std::fmt::Write;
    let _ = writeln!(out, "# TYPE {name} counter");
    let _ = writeln!(out, "{name} {val}");
}
