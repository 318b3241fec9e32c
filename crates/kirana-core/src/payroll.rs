//! # Payroll Calculator
//!
//! Attendance-based, pro-rated monthly salary.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  days_present   = Σ present(1) + halfday(0.5) in the target month       │
//! │  days_in_month  = actual length of the target month (leap years too)    │
//! │  daily_rate     = salary / days_in_month          (display, paise)      │
//! │  amount         = round_half_up(salary × days_present / days_in_month)  │
//! │                                                   (whole rupees)        │
//! │                                                                         │
//! │  Example: 9000 × 22.5 / 30 = 6750                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Attendance is counted in half-day units so the arithmetic stays integral;
//! the amount is computed from the salary directly rather than from the
//! rounded daily rate.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{AttendanceRecord, AttendanceStatus, FinancialRecord, SalaryPayment, Staff};
use crate::validation::validate_month;

// =============================================================================
// Calendar Helpers
// =============================================================================

/// Number of days in a calendar month.
///
/// ## Example
/// ```rust
/// use kirana_core::payroll::days_in_month;
///
/// assert_eq!(days_in_month(2, 2024).unwrap(), 29);
/// assert_eq!(days_in_month(2, 2023).unwrap(), 28);
/// assert!(days_in_month(13, 2024).is_err());
/// ```
pub fn days_in_month(month: u32, year: i32) -> CoreResult<u32> {
    validate_month(month)?;

    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = NaiveDate::from_ymd_opt(next_year, next_month, 1);

    match (first, next) {
        (Some(first), Some(next)) => Ok((next - first).num_days() as u32),
        _ => Err(CoreError::Validation(
            crate::error::ValidationError::InvalidFormat {
                field: "year".to_string(),
                reason: format!("{} is outside the supported calendar", year),
            },
        )),
    }
}

// =============================================================================
// Attendance
// =============================================================================

/// Attendance in half-day units for a month.
pub fn monthly_half_days(staff: &Staff, month: u32, year: i32) -> i64 {
    staff
        .attendance_in(month, year)
        .map(|record| record.status.half_days())
        .sum()
}

/// Days present in a month; fractional in 0.5 steps.
pub fn monthly_attendance(staff: &Staff, month: u32, year: i32) -> f64 {
    monthly_half_days(staff, month, year) as f64 / 2.0
}

/// Records attendance for a date, replacing any existing record for it.
pub fn upsert_attendance(staff: &mut Staff, date: NaiveDate, status: AttendanceStatus) {
    match staff.attendance_records.iter_mut().find(|r| r.date == date) {
        Some(existing) => existing.status = status,
        None => staff
            .attendance_records
            .push(AttendanceRecord { date, status }),
    }
}

// =============================================================================
// Payable Salary
// =============================================================================

/// Salary owed for a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PayableSalary {
    pub amount: Money,
    pub days_present: f64,
    pub days_in_month: u32,
    pub daily_rate: Money,
}

/// Computes the pro-rated salary for a staff member.
///
/// A zero salary yields a zero amount and daily rate; attendance is still
/// reported.
pub fn payable_salary(staff: &Staff, month: u32, year: i32) -> CoreResult<PayableSalary> {
    let days_in_month = days_in_month(month, year)?;
    let half_days = monthly_half_days(staff, month, year);

    let (amount, daily_rate) = if staff.salary.is_positive() {
        (
            staff
                .salary
                .prorate_to_major(half_days, 2 * i64::from(days_in_month)),
            staff.salary.divide_rounded(i64::from(days_in_month)),
        )
    } else {
        (Money::zero(), Money::zero())
    };

    Ok(PayableSalary {
        amount,
        days_present: half_days as f64 / 2.0,
        days_in_month,
        daily_rate,
    })
}

// =============================================================================
// Payments & Financial History
// =============================================================================

/// Records a salary payment, replacing any existing one for the same
/// (month, year). The amount is not checked against the payable salary.
pub fn record_payment(staff: &mut Staff, payment: SalaryPayment) -> CoreResult<()> {
    validate_month(payment.month)?;

    match staff
        .salary_payments
        .iter_mut()
        .find(|p| p.month == payment.month && p.year == payment.year)
    {
        Some(existing) => *existing = payment,
        None => staff.salary_payments.push(payment),
    }
    Ok(())
}

/// Appends a bonus / advance / return entry. Never affects payroll amounts.
pub fn add_financial_record(staff: &mut Staff, record: FinancialRecord) {
    staff.financial_records.push(record);
}

/// Finds a staff member by id for mutation.
pub fn find_staff_mut<'a>(staff: &'a mut [Staff], staff_id: &str) -> CoreResult<&'a mut Staff> {
    staff
        .iter_mut()
        .find(|s| s.id == staff_id)
        .ok_or_else(|| CoreError::StaffNotFound(staff_id.to_string()))
}

// =============================================================================
// Monthly Summary
// =============================================================================

/// One row of the monthly payroll sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PayrollLine {
    pub staff_id: String,
    pub name: String,
    pub payable: PayableSalary,
    pub payment: Option<SalaryPayment>,
}

/// Payable salary and recorded payment for every staff member.
pub fn payroll_summary(staff: &[Staff], month: u32, year: i32) -> CoreResult<Vec<PayrollLine>> {
    staff
        .iter()
        .map(|member| {
            Ok(PayrollLine {
                staff_id: member.id.clone(),
                name: member.name.clone(),
                payable: payable_salary(member, month, year)?,
                payment: member.payment_for(month, year).cloned(),
            })
        })
        .collect()
}

/// Convenience for callers holding a date rather than (month, year).
pub fn period_of(date: NaiveDate) -> (u32, i32) {
    (date.month(), date.year())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FinancialRecordType;

    fn staff(salary: i64) -> Staff {
        Staff {
            id: "st-1".to_string(),
            name: "Meena".to_string(),
            phone: String::new(),
            role: "Cashier".to_string(),
            salary: Money::from_major(salary),
            attendance_records: Vec::new(),
            salary_payments: Vec::new(),
            financial_records: Vec::new(),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(1, 2024).unwrap(), 31);
        assert_eq!(days_in_month(4, 2024).unwrap(), 30);
        assert_eq!(days_in_month(2, 2024).unwrap(), 29);
        assert_eq!(days_in_month(2, 1900).unwrap(), 28);
        assert_eq!(days_in_month(12, 2023).unwrap(), 31);
        assert!(days_in_month(0, 2024).is_err());
    }

    #[test]
    fn test_payable_salary_example() {
        // 22 present + 1 half day in a 30-day month
        let mut member = staff(9000);
        for d in 1..=22 {
            upsert_attendance(&mut member, day(2024, 4, d), AttendanceStatus::Present);
        }
        upsert_attendance(&mut member, day(2024, 4, 23), AttendanceStatus::HalfDay);
        upsert_attendance(&mut member, day(2024, 4, 24), AttendanceStatus::Absent);

        let payable = payable_salary(&member, 4, 2024).unwrap();
        assert_eq!(payable.days_in_month, 30);
        assert_eq!(payable.days_present, 22.5);
        assert_eq!(payable.daily_rate, Money::from_major(300));
        assert_eq!(payable.amount, Money::from_major(6750));
    }

    #[test]
    fn test_payable_salary_rounds_half_up() {
        // 1000 / 31 × 1 = 32.26 → 32; × 1.5 = 48.39 → 48
        let mut member = staff(1000);
        upsert_attendance(&mut member, day(2024, 1, 2), AttendanceStatus::Present);
        assert_eq!(payable_salary(&member, 1, 2024).unwrap().amount, Money::from_major(32));

        upsert_attendance(&mut member, day(2024, 1, 3), AttendanceStatus::HalfDay);
        assert_eq!(payable_salary(&member, 1, 2024).unwrap().amount, Money::from_major(48));
    }

    #[test]
    fn test_zero_salary_pays_nothing() {
        let mut member = staff(0);
        upsert_attendance(&mut member, day(2024, 2, 1), AttendanceStatus::Present);
        let payable = payable_salary(&member, 2, 2024).unwrap();
        assert!(payable.amount.is_zero());
        assert_eq!(payable.days_present, 1.0);
        assert_eq!(payable.days_in_month, 29);
    }

    #[test]
    fn test_attendance_only_counts_target_month() {
        let mut member = staff(3000);
        upsert_attendance(&mut member, day(2024, 1, 31), AttendanceStatus::Present);
        upsert_attendance(&mut member, day(2024, 2, 1), AttendanceStatus::Present);
        upsert_attendance(&mut member, day(2023, 2, 1), AttendanceStatus::Present);
        assert_eq!(monthly_attendance(&member, 2, 2024), 1.0);
    }

    #[test]
    fn test_attendance_upsert_by_date() {
        let mut member = staff(3000);
        upsert_attendance(&mut member, day(2024, 2, 1), AttendanceStatus::Present);
        upsert_attendance(&mut member, day(2024, 2, 1), AttendanceStatus::HalfDay);
        assert_eq!(member.attendance_records.len(), 1);
        assert_eq!(monthly_attendance(&member, 2, 2024), 0.5);
    }

    #[test]
    fn test_legacy_present_flag_counts_as_present() {
        let member: Staff = serde_json::from_str(
            r#"{"id":"st-9","name":"Old","salary":300000,
                "attendanceRecords":[{"date":"2024-06-03","present":true},
                                     {"date":"2024-06-04","status":"halfday"}]}"#,
        )
        .unwrap();
        assert_eq!(monthly_attendance(&member, 6, 2024), 1.5);
    }

    #[test]
    fn test_record_payment_upserts_by_period() {
        let mut member = staff(9000);
        let first = SalaryPayment {
            month: 4,
            year: 2024,
            amount: Money::from_major(6750),
            paid: false,
            paid_date: None,
        };
        let second = SalaryPayment {
            paid: true,
            amount: Money::from_major(7000),
            paid_date: Some(day(2024, 5, 1)),
            ..first.clone()
        };

        record_payment(&mut member, first).unwrap();
        record_payment(&mut member, second.clone()).unwrap();

        assert_eq!(member.salary_payments.len(), 1);
        assert_eq!(member.salary_payments[0], second);

        let other_period = SalaryPayment {
            month: 5,
            ..second
        };
        record_payment(&mut member, other_period).unwrap();
        assert_eq!(member.salary_payments.len(), 2);
    }

    #[test]
    fn test_financial_records_do_not_change_payable() {
        let mut member = staff(3000);
        upsert_attendance(&mut member, day(2024, 4, 1), AttendanceStatus::Present);
        let before = payable_salary(&member, 4, 2024).unwrap();

        add_financial_record(
            &mut member,
            FinancialRecord {
                kind: FinancialRecordType::Advance,
                amount: Money::from_major(500),
                date: day(2024, 4, 2),
                notes: "festival".to_string(),
            },
        );
        assert_eq!(member.financial_records.len(), 1);
        assert_eq!(payable_salary(&member, 4, 2024).unwrap(), before);
    }

    #[test]
    fn test_payroll_summary_and_lookup() {
        let mut roster = vec![staff(9000)];
        assert!(find_staff_mut(&mut roster, "missing").is_err());

        let member = find_staff_mut(&mut roster, "st-1").unwrap();
        record_payment(
            member,
            SalaryPayment {
                month: 4,
                year: 2024,
                amount: Money::from_major(100),
                paid: true,
                paid_date: Some(day(2024, 4, 30)),
            },
        )
        .unwrap();

        let summary = payroll_summary(&roster, 4, 2024).unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].name, "Meena");
        assert!(summary[0].payment.as_ref().unwrap().paid);
        assert_eq!(period_of(day(2024, 4, 30)), (4, 2024));
    }
}
