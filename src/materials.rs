//! Material readiness from a job's component list.
//!
//! Each committed component is either covered by stock, covered by a
//! purchase order, or short. A job cannot start before its last open
//! purchase order is due, so the latest open PO due date becomes the
//! job's material-ready date. Shortages with no PO are reported but do
//! not block scheduling; purchasing resolves them outside this crate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Component, Job};

/// Supply state of one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyStatus {
    /// On-hand quantity covers the commitment.
    InStock,
    /// Bought out and fully received.
    Received,
    /// Bought out, partly received.
    PartiallyReceived,
    /// Bought out, nothing received yet.
    OnOrder,
    /// Not enough stock and no purchase order.
    Short,
}

impl SupplyStatus {
    /// Whether the part is still waiting on a vendor.
    pub fn is_open_order(self) -> bool {
        matches!(self, SupplyStatus::PartiallyReceived | SupplyStatus::OnOrder)
    }
}

/// A component missing stock with nothing on order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shortage {
    /// Part number.
    pub part: String,
    /// Quantity missing.
    pub quantity: f64,
}

/// Material assessment for one job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialReport {
    /// Job ID.
    pub job_id: String,
    /// Earliest date all ordered material is due. `None` = nothing open.
    pub ready_date: Option<NaiveDate>,
    /// Components waiting on a vendor.
    pub open_orders: usize,
    /// Short components without a purchase order.
    pub shortages: Vec<Shortage>,
}

impl MaterialReport {
    /// Whether everything is on hand or received.
    pub fn is_clear(&self) -> bool {
        self.open_orders == 0 && self.shortages.is_empty()
    }
}

/// Classifies one component.
pub fn classify(component: &Component) -> SupplyStatus {
    match &component.purchase_order {
        Some(po) => {
            if po.qty_ordered > 0.0 && po.qty_received >= po.qty_ordered {
                SupplyStatus::Received
            } else if po.qty_received > 0.0 {
                SupplyStatus::PartiallyReceived
            } else {
                SupplyStatus::OnOrder
            }
        }
        None if component.qty_on_hand >= component.qty_committed => SupplyStatus::InStock,
        None => SupplyStatus::Short,
    }
}

/// Assesses all components of a job.
pub fn assess(job: &Job) -> MaterialReport {
    let mut report = MaterialReport {
        job_id: job.id.clone(),
        ..Default::default()
    };

    for component in &job.components {
        let status = classify(component);
        if status.is_open_order() {
            report.open_orders += 1;
            let due = component.purchase_order.as_ref().and_then(|po| po.due);
            if let Some(due) = due {
                report.ready_date = Some(report.ready_date.map_or(due, |d| d.max(due)));
            }
        } else if status == SupplyStatus::Short {
            report.shortages.push(Shortage {
                part: component.part.clone(),
                quantity: component.qty_committed - component.qty_on_hand,
            });
        }
    }

    report
}

/// Earliest date the job may start given its ready date and materials.
pub fn earliest_start(job: &Job, today: NaiveDate) -> NaiveDate {
    let material = assess(job).ready_date;
    [Some(today), job.ready_date, material]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, PurchaseOrder};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stock(part: &str, committed: f64, on_hand: f64) -> Component {
        Component {
            part: part.into(),
            description: String::new(),
            qty_committed: committed,
            qty_on_hand: on_hand,
            qty_issued: 0.0,
            purchase_order: None,
        }
    }

    fn ordered(part: &str, ordered: f64, received: f64, due: Option<NaiveDate>) -> Component {
        Component {
            purchase_order: Some(PurchaseOrder {
                number: format!("PO-{part}"),
                vendor: "Vendor".into(),
                qty_ordered: ordered,
                qty_received: received,
                due,
            }),
            ..stock(part, ordered, 0.0)
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&stock("A", 4.0, 10.0)), SupplyStatus::InStock);
        assert_eq!(classify(&stock("A", 4.0, 1.0)), SupplyStatus::Short);
        assert_eq!(classify(&ordered("B", 5.0, 5.0, None)), SupplyStatus::Received);
        assert_eq!(classify(&ordered("B", 5.0, 2.0, None)), SupplyStatus::PartiallyReceived);
        assert_eq!(classify(&ordered("B", 5.0, 0.0, None)), SupplyStatus::OnOrder);
    }

    #[test]
    fn test_ready_date_is_latest_open_po() {
        let job = Job::new("J1", Category::FabricatedMetal, 100.0)
            .with_component(ordered("HINGE", 10.0, 0.0, Some(date(2026, 10, 22))))
            .with_component(ordered("GLASS", 4.0, 1.0, Some(date(2026, 10, 27))))
            .with_component(ordered("LOCK", 4.0, 4.0, Some(date(2026, 11, 20)))) // received
            .with_component(stock("SHEET", 2.0, 1.0));

        let report = assess(&job);
        assert_eq!(report.ready_date, Some(date(2026, 10, 27)));
        assert_eq!(report.open_orders, 2);
        assert_eq!(report.shortages.len(), 1);
        assert_eq!(report.shortages[0].part, "SHEET");
        assert!((report.shortages[0].quantity - 1.0).abs() < 1e-12);
        assert!(!report.is_clear());
    }

    #[test]
    fn test_earliest_start() {
        let today = date(2026, 10, 19);
        let clear = Job::new("J1", Category::Specialty, 10.0);
        assert_eq!(earliest_start(&clear, today), today);
        assert!(assess(&clear).is_clear());

        let waiting = Job::new("J2", Category::Specialty, 10.0)
            .with_ready_date(date(2026, 10, 21))
            .with_component(ordered("X", 1.0, 0.0, Some(date(2026, 10, 24))));
        assert_eq!(earliest_start(&waiting, today), date(2026, 10, 24));

        let past = Job::new("J3", Category::Specialty, 10.0).with_ready_date(date(2026, 10, 1));
        assert_eq!(earliest_start(&past, today), today);
    }
}
