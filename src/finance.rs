//! Money derived from a project's cost, advance and payment status.
//!
//! Everything here is pure: the same projects always produce the same figures,
//! and nothing is cached between calls.

use std::collections::HashMap;

use crate::models::{Client, PaymentStatus, Project};

/// Per-project money split.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Amounts {
    pub cost: f64,
    pub advance: f64,
    pub received: f64,
    pub pending: f64,
}

/// Sum of [`Amounts`] over a set of projects.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    pub total: f64,
    pub received: f64,
    pub pending: f64,
}

/// Per-client rollup shown on the studio overview.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClientStats {
    pub total: f64,
    pub received: f64,
    pub pending: f64,
    pub projects: usize,
}

/// Received is the full cost once paid, the advance while partial, nothing otherwise.
///
/// Missing numbers count as zero. Received never exceeds cost, so pending is
/// never negative.
pub fn amounts(project: &Project) -> Amounts {
    let cost = project.cost.unwrap_or(0.0);
    let advance = project.advance.unwrap_or(0.0);

    let received = match project.payment_status {
        Some(PaymentStatus::Paid) => cost,
        Some(PaymentStatus::Partial) => advance.min(cost),
        Some(PaymentStatus::Unpaid) | None => 0.0,
    };
    let pending = (cost - received).max(0.0);

    Amounts {
        cost,
        advance,
        received,
        pending,
    }
}

pub fn aggregate<'a, I>(projects: I) -> Totals
where
    I: IntoIterator<Item = &'a Project>,
{
    projects.into_iter().map(amounts).fold(Totals::default(), |acc, a| Totals {
        total: acc.total + a.cost,
        received: acc.received + a.received,
        pending: acc.pending + a.pending,
    })
}

pub fn client_stats(projects: &[Project]) -> HashMap<i64, ClientStats> {
    let mut map: HashMap<i64, ClientStats> = HashMap::new();
    for project in projects {
        let a = amounts(project);
        let stats = map.entry(project.client_id).or_default();
        stats.total += a.cost;
        stats.received += a.received;
        stats.pending += a.pending;
        stats.projects += 1;
    }
    map
}

pub fn studio_totals(stats: &HashMap<i64, ClientStats>) -> Totals {
    stats.values().fold(Totals::default(), |acc, s| Totals {
        total: acc.total + s.total,
        received: acc.received + s.received,
        pending: acc.pending + s.pending,
    })
}

/// Largest per-client total among `clients`; 1 when nothing is positive so
/// bar widths can always divide by it.
pub fn max_client_total<'a>(
    clients: impl IntoIterator<Item = &'a Client>,
    stats: &HashMap<i64, ClientStats>,
) -> f64 {
    let max = clients
        .into_iter()
        .filter_map(|c| stats.get(&c.id))
        .map(|s| s.total)
        .fold(0.0, f64::max);

    if max > 0.0 { max } else { 1.0 }
}

/// Width of a client's budget bar, in percent of the widest client. Never
/// below 8 so empty clients still show a stub.
pub fn bar_width_percent(stats: &ClientStats, max_total: f64) -> f64 {
    (stats.total / max_total * 100.0).clamp(8.0, 100.0)
}

/// Share of a client's budget still pending, in percent.
pub fn pending_share_percent(stats: &ClientStats) -> f64 {
    if stats.total > 0.0 {
        stats.pending / stats.total * 100.0
    } else {
        0.0
    }
}

/// Whole-unit money with a currency prefix, e.g. `₹1500`.
pub fn format_money(symbol: &str, value: f64) -> String {
    format!("{}{:.0}", symbol, value.round())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(cost: Option<f64>, advance: Option<f64>, status: Option<PaymentStatus>) -> Project {
        let mut p = Project::fixture(1, 1, "p");
        p.cost = cost;
        p.advance = advance;
        p.payment_status = status;
        p
    }

    #[test]
    fn partial_counts_the_advance() {
        let a = amounts(&project(Some(1000.0), Some(300.0), Some(PaymentStatus::Partial)));
        assert_eq!(
            a,
            Amounts {
                cost: 1000.0,
                advance: 300.0,
                received: 300.0,
                pending: 700.0
            }
        );
    }

    #[test]
    fn paid_receives_full_cost() {
        let a = amounts(&project(Some(1000.0), None, Some(PaymentStatus::Paid)));
        assert_eq!(a.received, 1000.0);
        assert_eq!(a.pending, 0.0);
    }

    #[test]
    fn unpaid_and_missing_status_receive_nothing() {
        let a = amounts(&project(Some(1000.0), Some(400.0), Some(PaymentStatus::Unpaid)));
        assert_eq!(a.received, 0.0);
        assert_eq!(a.pending, 1000.0);

        let a = amounts(&project(Some(1000.0), Some(400.0), None));
        assert_eq!(a.received, 0.0);
        assert_eq!(a.pending, 1000.0);
    }

    #[test]
    fn missing_numbers_default_to_zero() {
        let a = amounts(&project(None, None, Some(PaymentStatus::Paid)));
        assert_eq!(a, Amounts::default());
    }

    #[test]
    fn advance_larger_than_cost_never_makes_pending_negative() {
        let a = amounts(&project(Some(500.0), Some(800.0), Some(PaymentStatus::Partial)));
        assert_eq!(a.advance, 800.0);
        assert_eq!(a.received, 500.0);
        assert_eq!(a.pending, 0.0);
    }

    #[test]
    fn pending_is_cost_minus_received_for_every_status() {
        let statuses = [
            None,
            Some(PaymentStatus::Unpaid),
            Some(PaymentStatus::Partial),
            Some(PaymentStatus::Paid),
        ];
        for status in statuses {
            for (cost, advance) in [(0.0, 0.0), (100.0, 20.0), (100.0, 250.0), (99.5, 99.5)] {
                let p = project(Some(cost), Some(advance), status);
                let a = amounts(&p);
                assert!(a.pending >= 0.0);
                assert!(a.received <= a.cost);
                assert_eq!(a.pending, (a.cost - a.received).max(0.0));
                assert_eq!(amounts(&p), a);
            }
        }
    }

    #[test]
    fn aggregate_of_nothing_is_zero() {
        assert_eq!(aggregate(&[] as &[Project]), Totals::default());
    }

    #[test]
    fn aggregate_sums_every_project() {
        let projects = vec![
            project(Some(1000.0), Some(300.0), Some(PaymentStatus::Partial)),
            project(Some(500.0), None, Some(PaymentStatus::Paid)),
            project(Some(200.0), None, None),
        ];
        let totals = aggregate(&projects);
        assert_eq!(
            totals,
            Totals {
                total: 1700.0,
                received: 800.0,
                pending: 900.0
            }
        );

        let reversed: Vec<Project> = projects.iter().rev().cloned().collect();
        assert_eq!(aggregate(&reversed), totals);
    }

    #[test]
    fn client_stats_group_by_client() {
        let mut a = project(Some(1000.0), Some(300.0), Some(PaymentStatus::Partial));
        a.client_id = 1;
        let mut b = project(Some(400.0), None, Some(PaymentStatus::Paid));
        b.client_id = 1;
        let mut c = project(Some(250.0), None, Some(PaymentStatus::Unpaid));
        c.client_id = 2;
        let projects = vec![a.clone(), b.clone(), c.clone()];

        let stats = client_stats(&projects);
        assert_eq!(stats.len(), 2);

        let one = stats[&1];
        assert_eq!(one.projects, 2);
        let expected = aggregate([&a, &b]);
        assert_eq!((one.total, one.received, one.pending), (expected.total, expected.received, expected.pending));

        assert_eq!(stats[&2].pending, 250.0);
        assert_eq!(studio_totals(&stats), aggregate(&projects));
    }

    #[test]
    fn max_total_defaults_to_one() {
        let stats = HashMap::new();
        assert_eq!(max_client_total(std::iter::empty(), &stats), 1.0);

        let clients = vec![Client::fixture(1, "Acme"), Client::fixture(2, "Bexo")];
        assert_eq!(max_client_total(&clients, &stats), 1.0);

        let mut p = project(Some(900.0), None, None);
        p.client_id = 2;
        let stats = client_stats(&[p]);
        assert_eq!(max_client_total(&clients, &stats), 900.0);
    }

    #[test]
    fn bar_geometry() {
        let stats = ClientStats {
            total: 50.0,
            received: 10.0,
            pending: 40.0,
            projects: 1,
        };
        assert_eq!(bar_width_percent(&stats, 100.0), 50.0);
        assert_eq!(bar_width_percent(&ClientStats::default(), 100.0), 8.0);
        assert_eq!(pending_share_percent(&stats), 80.0);
        assert_eq!(pending_share_percent(&ClientStats::default()), 0.0);
    }

    #[test]
    fn money_has_no_decimals() {
        assert_eq!(format_money("₹", 1499.6), "₹1500");
        assert_eq!(format_money("$", 0.0), "$0");
    }

    #[test]
    fn money_rounds_halves_up() {
        assert_eq!(format_money("₹", 0.5), "₹1");
        assert_eq!(format_money("₹", 2.5), "₹3");
        assert_eq!(format_money("₹", 1234.5), "₹1235");
    }
}
