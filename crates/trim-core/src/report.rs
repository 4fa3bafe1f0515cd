//! # Revenue Report
//!
//! Aggregates a business's invoices into the figures shown on the revenue
//! dashboard.
//!
//! Attribution follows the dashboard:
//! - per employee: service total + misc total of each invoice
//! - per service: the invoice's service total, credited to every service
//!   listed on it

use serde::Serialize;
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::types::Invoice;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EmployeeRevenue {
    pub employee_id: String,
    pub invoice_count: u64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ServiceRevenue {
    pub service_id: String,
    pub invoice_count: u64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RevenueReport {
    pub invoice_count: u64,
    pub service_total_cents: i64,
    pub misc_total_cents: i64,
    pub products_total_cents: i64,
    pub tax_cents: i64,
    pub tip_cents: i64,
    pub total_cents: i64,
    /// Sorted by revenue, highest first.
    pub by_employee: Vec<EmployeeRevenue>,
    /// Sorted by revenue, highest first.
    pub by_service: Vec<ServiceRevenue>,
}

/// Builds the report over `invoices`. Callers filter by business and date.
///
/// Sums saturate at `i64::MAX` cents.
pub fn revenue_report(invoices: &[Invoice]) -> RevenueReport {
    let mut report = RevenueReport::default();
    let mut employees: BTreeMap<&str, EmployeeRevenue> = BTreeMap::new();
    let mut services: BTreeMap<&str, ServiceRevenue> = BTreeMap::new();

    for inv in invoices {
        report.invoice_count += 1;
        report.service_total_cents = report.service_total_cents.saturating_add(inv.service_total_cents);
        report.misc_total_cents = report.misc_total_cents.saturating_add(inv.misc_total_cents);
        report.products_total_cents = report.products_total_cents.saturating_add(inv.products_total_cents);
        report.tax_cents = report.tax_cents.saturating_add(inv.tax_cents);
        report.tip_cents = report.tip_cents.saturating_add(inv.tip_cents);
        report.total_cents = report.total_cents.saturating_add(inv.total_cents);

        let emp = employees
            .entry(inv.employee_id.as_str())
            .or_insert_with(|| EmployeeRevenue {
                employee_id: inv.employee_id.clone(),
                ..Default::default()
            });
        emp.invoice_count += 1;
        emp.revenue_cents = emp
            .revenue_cents
            .saturating_add(inv.service_total_cents)
            .saturating_add(inv.misc_total_cents);

        for service_id in &inv.service_ids {
            let svc = services
                .entry(service_id.as_str())
                .or_insert_with(|| ServiceRevenue {
                    service_id: service_id.clone(),
                    ..Default::default()
                });
            svc.invoice_count += 1;
            svc.revenue_cents = svc.revenue_cents.saturating_add(inv.service_total_cents);
        }
    }

    report.by_employee = employees.into_values().collect();
    report
        .by_employee
        .sort_by(|a, b| b.revenue_cents.cmp(&a.revenue_cents));
    report.by_service = services.into_values().collect();
    report
        .by_service
        .sort_by(|a, b| b.revenue_cents.cmp(&a.revenue_cents));
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InvoiceStatus, PaymentMethod};
    use chrono::Utc;

    fn invoice(employee: &str, services: &[&str], service_total: i64, misc: i64, tip: i64) -> Invoice {
        Invoice {
            id: format!("inv-{employee}-{service_total}"),
            business_id: "biz".into(),
            booking_id: "bk".into(),
            contact_id: "ct".into(),
            employee_id: employee.into(),
            service_ids: services.iter().map(|s| s.to_string()).collect(),
            misc_items: vec![],
            products: vec![],
            tax_rate_bps: 0,
            service_total_cents: service_total,
            misc_total_cents: misc,
            products_total_cents: 0,
            tax_cents: 0,
            tip_cents: tip,
            total_cents: service_total.saturating_add(misc).saturating_add(tip),
            payment_method: PaymentMethod::Card,
            status: InvoiceStatus::Paid,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_report() {
        let report = revenue_report(&[]);
        assert_eq!(report, RevenueReport::default());
    }

    #[test]
    fn test_totals_and_breakdowns() {
        let invoices = vec![
            invoice("alex", &["cut"], 4000, 500, 500),
            invoice("alex", &["cut", "beard"], 6000, 0, 0),
            invoice("jo", &["beard"], 2000, 0, 300),
        ];
        let report = revenue_report(&invoices);

        assert_eq!(report.invoice_count, 3);
        assert_eq!(report.service_total_cents, 12000);
        assert_eq!(report.misc_total_cents, 500);
        assert_eq!(report.tip_cents, 800);
        assert_eq!(report.total_cents, 13300);

        assert_eq!(report.by_employee[0].employee_id, "alex");
        assert_eq!(report.by_employee[0].revenue_cents, 10500);
        assert_eq!(report.by_employee[1].revenue_cents, 2000);

        // Both services on the second invoice are credited its service total
        let beard = report.by_service.iter().find(|s| s.service_id == "beard").unwrap();
        assert_eq!(beard.revenue_cents, 8000);
        assert_eq!(beard.invoice_count, 2);
        let cut = report.by_service.iter().find(|s| s.service_id == "cut").unwrap();
        assert_eq!(cut.revenue_cents, 10000);
    }

    #[test]
    fn test_large_totals_saturate() {
        let invoices = vec![
            invoice("alex", &["cut"], i64::MAX - 10, 0, 0),
            invoice("alex", &["cut"], 4000, 0, 0),
        ];
        let report = revenue_report(&invoices);
        assert_eq!(report.service_total_cents, i64::MAX);
        assert_eq!(report.by_employee[0].revenue_cents, i64::MAX);
        assert_eq!(report.by_service[0].revenue_cents, i64::MAX);
    }
}
