//! # Expense Service
//!
//! Non-stock spending (rent, electricity, tea). Counted in the daily
//! report's net profit, never in cash-in-hand.

use tracing::info;

use crate::error::LedgerResult;
use crate::Ledger;
use kirana_core::validation::validate_new_expense;
use kirana_core::{ChangeSet, Collection, CoreError, Expense, NewExpense};

/// Expense operations bound to a [`Ledger`].
#[derive(Debug, Clone, Copy)]
pub struct Expenses<'a> {
    ledger: &'a Ledger,
}

impl<'a> Expenses<'a> {
    pub(crate) fn new(ledger: &'a Ledger) -> Self {
        Expenses { ledger }
    }

    /// Records an expense. Description is required and the amount must be
    /// positive.
    pub async fn add_expense(&self, input: NewExpense) -> LedgerResult<Expense> {
        validate_new_expense(&input)?;

        let expense = Expense {
            id: self.ledger.new_id(),
            date: input.date,
            description: input.description.trim().to_string(),
            category: input.category.trim().to_string(),
            amount: input.amount,
        };

        let _guard = self.ledger.lock_writes().await;
        let mut expenses = self.list_expenses().await?;
        expenses.push(expense.clone());
        self.ledger
            .commit(ChangeSet::new().with_expenses(expenses))
            .await?;

        info!(
            expense_id = %expense.id,
            date = %expense.date,
            amount = %expense.amount,
            "Expense recorded"
        );
        Ok(expense)
    }

    pub async fn delete_expense(&self, expense_id: &str) -> LedgerResult<Expense> {
        let _guard = self.ledger.lock_writes().await;
        let mut expenses = self.list_expenses().await?;

        let index = expenses
            .iter()
            .position(|e| e.id == expense_id)
            .ok_or_else(|| CoreError::ExpenseNotFound(expense_id.to_string()))?;
        let removed = expenses.remove(index);

        self.ledger
            .commit(ChangeSet::new().with_expenses(expenses))
            .await?;

        info!(expense_id = %removed.id, "Expense deleted");
        Ok(removed)
    }

    pub async fn list_expenses(&self) -> LedgerResult<Vec<Expense>> {
        Ok(self
            .ledger
            .database()
            .documents()
            .get(Collection::Expenses)
            .await?)
    }
}
