use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;

static EXPORTER: OnceCell<()> = OnceCell::new();
static PROMETHEUS_ENABLED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetricKind {
    Counter,
    Histogram,
}

/// 金库事件导出的全部指标。
const METRICS: &[(&str, MetricKind, &str)] = &[
    ("index_vault_deposits_total", MetricKind::Counter, "已派发的 TON 存款"),
    ("index_vault_swaps_dispatched_total", MetricKind::Counter, "存款拆分出的兑换腿"),
    ("index_vault_legs_arrived_total", MetricKind::Counter, "按篮子下标统计的到账腿"),
    ("index_vault_mints_total", MetricKind::Counter, "完成的指数铸造"),
    ("index_vault_refunds_total", MetricKind::Counter, "铸造后退回的多余成分"),
    ("index_vault_mint_amount", MetricKind::Histogram, "单次铸造的指数数量"),
    ("index_vault_redemptions_total", MetricKind::Counter, "按赎回方式统计的销毁"),
    ("index_vault_burn_amount", MetricKind::Histogram, "单次销毁的指数数量"),
    ("index_vault_waiting_cleared_total", MetricKind::Counter, "管理员清理的等待条目"),
    ("index_vault_admin_actions_total", MetricKind::Counter, "按动作统计的管理员操作"),
    ("index_vault_reconfigurations_total", MetricKind::Counter, "生效的篮子重新配置"),
    ("index_vault_rejections_total", MetricKind::Counter, "按原因统计的拒绝消息"),
];

fn describe_metrics() {
    for (name, kind, description) in METRICS {
        match kind {
            MetricKind::Counter => describe_counter!(*name, *description),
            MetricKind::Histogram => describe_histogram!(*name, *description),
        }
    }
}

/// 安装 Prometheus 导出器；重复调用只生效一次。
pub fn try_init_prometheus(listen: &str) -> Result<()> {
    EXPORTER
        .get_or_try_init(|| {
            let addr: SocketAddr = listen
                .parse()
                .with_context(|| format!("invalid prometheus listen address: {listen}"))?;
            PrometheusBuilder::new()
                .with_http_listener(addr)
                .install()
                .context("failed to install prometheus exporter")?;
            describe_metrics();
            PROMETHEUS_ENABLED.store(true, Ordering::Relaxed);
            Ok(())
        })
        .map(|_| ())
}

pub fn prometheus_enabled() -> bool {
    PROMETHEUS_ENABLED.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_listen_address_is_rejected_without_enabling() {
        assert!(try_init_prometheus("not-an-address").is_err());
        assert!(!prometheus_enabled());
    }

    #[test]
    fn every_emitted_metric_is_described() {
        let source = include_str!("events.rs");
        let emitted: Vec<&str> = source
            .split('"')
            .filter(|token| token.starts_with("index_vault_"))
            .collect();
        assert!(!emitted.is_empty());
        for name in emitted {
            let (_, kind, _) = METRICS
                .iter()
                .find(|(described, _, _)| *described == name)
                .unwrap_or_else(|| panic!("{name} has no description"));
            assert_eq!(*kind == MetricKind::Counter, name.ends_with("_total"), "{name}");
        }
        // 未安装记录器时描述是空操作
        describe_metrics();
    }
}
