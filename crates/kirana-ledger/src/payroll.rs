//! # Payroll Service
//!
//! Staff records, attendance, salary payments and the money history kept
//! alongside them. The arithmetic lives in `kirana_core::payroll`; this
//! module loads the staff collection, applies one change and writes it back.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::LedgerResult;
use crate::Ledger;
use kirana_core::payroll::{self, PayableSalary, PayrollLine};
use kirana_core::validation::{validate_amount, validate_month, validate_new_staff};
use kirana_core::{
    AttendanceStatus, ChangeSet, Collection, CoreError, FinancialRecord, FinancialRecordType,
    Money, NewStaff, SalaryPayment, Staff,
};

/// Payroll operations bound to a [`Ledger`].
#[derive(Debug, Clone, Copy)]
pub struct Payroll<'a> {
    ledger: &'a Ledger,
}

impl<'a> Payroll<'a> {
    pub(crate) fn new(ledger: &'a Ledger) -> Self {
        Payroll { ledger }
    }

    // =========================================================================
    // Staff Records
    // =========================================================================

    pub async fn add_staff(&self, input: NewStaff) -> LedgerResult<Staff> {
        validate_new_staff(&input)?;

        let member = Staff {
            id: self.ledger.new_id(),
            name: input.name.trim().to_string(),
            phone: input.phone.trim().to_string(),
            role: input.role.trim().to_string(),
            salary: input.salary,
            attendance_records: Vec::new(),
            salary_payments: Vec::new(),
            financial_records: Vec::new(),
        };

        let added = member.clone();
        self.update_staff(move |staff| {
            staff.push(member);
            Ok(())
        })
        .await?;

        info!(staff_id = %added.id, name = %added.name, "Staff member added");
        Ok(added)
    }

    pub async fn list_staff(&self) -> LedgerResult<Vec<Staff>> {
        Ok(self.ledger.database().documents().get(Collection::Staff).await?)
    }

    pub async fn get_staff(&self, staff_id: &str) -> LedgerResult<Staff> {
        self.list_staff()
            .await?
            .into_iter()
            .find(|s| s.id == staff_id)
            .ok_or_else(|| CoreError::StaffNotFound(staff_id.to_string()).into())
    }

    // =========================================================================
    // Attendance
    // =========================================================================

    /// Records attendance for a date, replacing any earlier entry for it.
    pub async fn mark_attendance(
        &self,
        staff_id: &str,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> LedgerResult<()> {
        self.update_member(staff_id, |member| {
            payroll::upsert_attendance(member, date, status);
            Ok(())
        })
        .await?;

        debug!(staff_id = %staff_id, %date, ?status, "Attendance marked");
        Ok(())
    }

    /// Days present in a month; half days count 0.5.
    pub async fn monthly_attendance(&self, staff_id: &str, month: u32, year: i32) -> LedgerResult<f64> {
        validate_month(month)?;
        let member = self.get_staff(staff_id).await?;
        Ok(payroll::monthly_attendance(&member, month, year))
    }

    // =========================================================================
    // Salary
    // =========================================================================

    /// Pro-rated salary owed for a month.
    pub async fn payable_salary(
        &self,
        staff_id: &str,
        month: u32,
        year: i32,
    ) -> LedgerResult<PayableSalary> {
        let member = self.get_staff(staff_id).await?;
        Ok(payroll::payable_salary(&member, month, year)?)
    }

    /// Marks a month's salary as paid, replacing any earlier payment for the
    /// same period. The amount may differ from the payable salary.
    pub async fn record_payment(
        &self,
        staff_id: &str,
        month: u32,
        year: i32,
        amount: Money,
        paid_date: NaiveDate,
    ) -> LedgerResult<SalaryPayment> {
        validate_amount("amount", amount)?;
        validate_month(month)?;

        let payment = SalaryPayment {
            month,
            year,
            amount,
            paid: true,
            paid_date: Some(paid_date),
        };

        let recorded = payment.clone();
        self.update_member(staff_id, move |member| payroll::record_payment(member, payment))
            .await?;

        info!(
            staff_id = %staff_id,
            month,
            year,
            amount = %amount,
            "Salary payment recorded"
        );
        Ok(recorded)
    }

    /// Appends a bonus, advance or return to the staff member's history.
    /// Does not change payroll amounts.
    pub async fn record_financial_transaction(
        &self,
        staff_id: &str,
        kind: FinancialRecordType,
        amount: Money,
        date: NaiveDate,
        notes: &str,
    ) -> LedgerResult<FinancialRecord> {
        validate_amount("amount", amount)?;

        let record = FinancialRecord {
            kind,
            amount,
            date,
            notes: notes.trim().to_string(),
        };

        let recorded = record.clone();
        self.update_member(staff_id, move |member| {
            payroll::add_financial_record(member, record);
            Ok(())
        })
        .await?;

        info!(staff_id = %staff_id, ?kind, amount = %amount, "Financial record added");
        Ok(recorded)
    }

    /// Payable salary and recorded payment for every staff member.
    pub async fn payroll_summary(&self, month: u32, year: i32) -> LedgerResult<Vec<PayrollLine>> {
        let staff = self.list_staff().await?;
        Ok(payroll::payroll_summary(&staff, month, year)?)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn update_member<F>(&self, staff_id: &str, change: F) -> LedgerResult<()>
    where
        F: FnOnce(&mut Staff) -> Result<(), CoreError>,
    {
        self.update_staff(|staff| change(payroll::find_staff_mut(staff, staff_id)?))
            .await
    }

    async fn update_staff<F>(&self, change: F) -> LedgerResult<()>
    where
        F: FnOnce(&mut Vec<Staff>) -> Result<(), CoreError>,
    {
        let _guard = self.ledger.lock_writes().await;

        let mut staff: Vec<Staff> = self.ledger.database().documents().get(Collection::Staff).await?;
        change(&mut staff)?;

        self.ledger.commit(ChangeSet::new().with_staff(staff)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use crate::ErrorKind;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn with_staff(salary: i64) -> (crate::Ledger, Staff) {
        let ledger = ledger().await;
        let member = ledger
            .payroll()
            .add_staff(NewStaff {
                name: " Ramesh ".to_string(),
                phone: "98765 43210".to_string(),
                role: "Helper".to_string(),
                salary: Money::from_major(salary),
            })
            .await
            .unwrap();
        (ledger, member)
    }

    #[tokio::test]
    async fn test_add_staff_trims_and_persists() {
        let (ledger, member) = with_staff(9000).await;
        assert_eq!(member.name, "Ramesh");
        assert_eq!(ledger.payroll().get_staff(&member.id).await.unwrap(), member);

        let err = ledger
            .payroll()
            .add_staff(NewStaff::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_payable_salary_from_attendance() {
        let (ledger, member) = with_staff(9000).await;
        let payroll = ledger.payroll();

        // 22 full days + 1 half day in November 2024 (30 days)
        for d in 1..=22 {
            payroll
                .mark_attendance(&member.id, date(2024, 11, d), AttendanceStatus::Present)
                .await
                .unwrap();
        }
        payroll
            .mark_attendance(&member.id, date(2024, 11, 23), AttendanceStatus::HalfDay)
            .await
            .unwrap();
        payroll
            .mark_attendance(&member.id, date(2024, 11, 24), AttendanceStatus::Absent)
            .await
            .unwrap();

        let payable = payroll.payable_salary(&member.id, 11, 2024).await.unwrap();
        assert_eq!(payable.days_present, 22.5);
        assert_eq!(payable.days_in_month, 30);
        assert_eq!(payable.daily_rate, Money::from_major(300));
        assert_eq!(payable.amount, Money::from_major(6750));

        assert_eq!(
            payroll.monthly_attendance(&member.id, 11, 2024).await.unwrap(),
            22.5
        );
    }

    #[tokio::test]
    async fn test_attendance_upserts_by_date() {
        let (ledger, member) = with_staff(9000).await;
        let payroll = ledger.payroll();
        let day = date(2024, 2, 10);

        payroll
            .mark_attendance(&member.id, day, AttendanceStatus::Absent)
            .await
            .unwrap();
        payroll
            .mark_attendance(&member.id, day, AttendanceStatus::Present)
            .await
            .unwrap();

        let stored = payroll.get_staff(&member.id).await.unwrap();
        assert_eq!(stored.attendance_records.len(), 1);
        assert_eq!(stored.attendance_records[0].status, AttendanceStatus::Present);
    }

    #[tokio::test]
    async fn test_payment_upserts_by_period() {
        let (ledger, member) = with_staff(9000).await;
        let payroll = ledger.payroll();

        payroll
            .record_payment(&member.id, 11, 2024, Money::from_major(6000), date(2024, 12, 1))
            .await
            .unwrap();
        payroll
            .record_payment(&member.id, 11, 2024, Money::from_major(6750), date(2024, 12, 2))
            .await
            .unwrap();

        let stored = payroll.get_staff(&member.id).await.unwrap();
        assert_eq!(stored.salary_payments.len(), 1);
        assert_eq!(stored.salary_payments[0].amount, Money::from_major(6750));
        assert_eq!(stored.salary_payments[0].paid_date, Some(date(2024, 12, 2)));

        let summary = payroll.payroll_summary(11, 2024).await.unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(
            summary[0].payment.as_ref().map(|p| p.amount),
            Some(Money::from_major(6750))
        );
    }

    #[tokio::test]
    async fn test_payment_amount_must_be_positive() {
        let (ledger, member) = with_staff(9000).await;
        let payroll = ledger.payroll();

        for amount in [Money::from_major(-100), Money::zero()] {
            let err = payroll
                .record_payment(&member.id, 11, 2024, amount, date(2024, 12, 1))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }

        let stored = payroll.get_staff(&member.id).await.unwrap();
        assert!(stored.salary_payments.is_empty());
    }

    #[tokio::test]
    async fn test_financial_records_do_not_touch_payroll() {
        let (ledger, member) = with_staff(9000).await;
        let payroll = ledger.payroll();

        payroll
            .record_financial_transaction(
                &member.id,
                FinancialRecordType::Advance,
                Money::from_major(500),
                date(2024, 11, 5),
                "festival",
            )
            .await
            .unwrap();

        let stored = payroll.get_staff(&member.id).await.unwrap();
        assert_eq!(stored.financial_records.len(), 1);
        assert_eq!(
            payroll.payable_salary(&member.id, 11, 2024).await.unwrap().amount,
            Money::zero()
        );
    }

    #[tokio::test]
    async fn test_unknown_staff_and_bad_month() {
        let (ledger, _) = with_staff(9000).await;
        let payroll = ledger.payroll();

        let err = payroll
            .mark_attendance("ghost", date(2024, 1, 1), AttendanceStatus::Present)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        assert!(payroll.payroll_summary(13, 2024).await.is_err());
    }
}
