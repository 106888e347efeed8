use std::fmt;
use std::io::Write;

use chrono::Utc;
use serde_json::Value;

use super::records::{BalanceUpdate, TransactionRecord, UserProfile};
use super::Reporter;
use crate::config::ProbeOptions;
use crate::database::{DatabaseError, FirebaseDatabase, Reference};

pub const USERS: &str = "usuarios";
pub const TRANSACTIONS: &str = "transacciones";
pub const TEST_USER_ID: &str = "usuario_test_001";
/// Field deleted from the test user by the field-removal step.
pub const REMOVED_FIELD: &str = "activo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrudStep {
    SetUser,
    PushTransaction,
    ReadUser,
    ReadTransactions,
    UpdateUser,
    RemoveField,
    RemoveUser,
    RemoveTransaction,
}

impl fmt::Display for CrudStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrudStep::SetUser => "set user",
            CrudStep::PushTransaction => "push transaction",
            CrudStep::ReadUser => "read user",
            CrudStep::ReadTransactions => "read transactions",
            CrudStep::UpdateUser => "update user",
            CrudStep::RemoveField => "remove field",
            CrudStep::RemoveUser => "remove user",
            CrudStep::RemoveTransaction => "remove transaction",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Passed,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub step: CrudStep,
    pub outcome: StepOutcome,
}

fn finish<W: Write>(
    reporter: &mut Reporter<W>,
    step: CrudStep,
    result: Result<(), DatabaseError>,
) -> StepReport {
    let outcome = match result {
        Ok(()) => StepOutcome::Passed,
        Err(err) => {
            tracing::warn!(%step, error = %err, "database step failed");
            reporter.line(format!("Error during {}: {}", step, err));
            StepOutcome::Failed(err.to_string())
        }
    };
    StepReport { step, outcome }
}

fn skip<W: Write>(reporter: &mut Reporter<W>, step: CrudStep, reason: &str) -> StepReport {
    reporter.line(reason);
    StepReport {
        step,
        outcome: StepOutcome::Skipped(reason.to_string()),
    }
}

/// Strings print without quotes; everything else as compact JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(super) async fn set_user<W: Write>(
    user: &Reference<'_>,
    reporter: &mut Reporter<W>,
) -> Result<(), DatabaseError> {
    user.set(&UserProfile::sample()).await?;
    reporter.line(format!("User '{}' created/updated.", TEST_USER_ID));
    Ok(())
}

pub(super) async fn push_transaction<W: Write>(
    transactions: &Reference<'_>,
    reporter: &mut Reporter<W>,
) -> Result<String, DatabaseError> {
    let record = TransactionRecord::grocery_purchase(TEST_USER_ID, Utc::now().timestamp());
    let key = transactions.push(&record).await?;
    reporter.line(format!("Transaction added with key: {}", key));
    Ok(key)
}

pub(super) async fn read_user<W: Write>(
    user: &Reference<'_>,
    reporter: &mut Reporter<W>,
) -> Result<(), DatabaseError> {
    let snapshot = user.get().await?;
    let fields = snapshot.each();

    if fields.is_empty() {
        reporter.line(format!("No data found for user '{}'.", TEST_USER_ID));
        return Ok(());
    }

    reporter.line(format!("Data for user '{}':", TEST_USER_ID));
    for field in fields {
        reporter.line(format!(
            "    {}: {}",
            field.key().unwrap_or_default(),
            display_value(field.val())
        ));
    }
    Ok(())
}

pub(super) async fn read_transactions<W: Write>(
    transactions: &Reference<'_>,
    reporter: &mut Reporter<W>,
) -> Result<(), DatabaseError> {
    let snapshot = transactions.get().await?;
    if !snapshot.exists() {
        reporter.line("No transactions found.");
        return Ok(());
    }

    reporter.line("Transactions found:");
    for transaction in snapshot.each() {
        reporter.line(format!(
            "    Key: {} | Data: {}",
            transaction.key().unwrap_or_default(),
            transaction.val()
        ));
    }
    Ok(())
}

pub(super) async fn read_back<W: Write>(
    user: &Reference<'_>,
    label: &str,
    reporter: &mut Reporter<W>,
) -> Result<(), DatabaseError> {
    let snapshot = user.get().await?;
    reporter.line(format!(
        "User '{}' after {}: {}",
        TEST_USER_ID,
        label,
        snapshot.val()
    ));
    Ok(())
}

pub(super) async fn update_user<W: Write>(
    user: &Reference<'_>,
    reporter: &mut Reporter<W>,
) -> Result<(), DatabaseError> {
    let update = BalanceUpdate {
        balance: 1450.50,
        updated_at: Utc::now().timestamp(),
    };
    user.update(&update).await?;
    reporter.line(format!("Balance of user '{}' updated.", TEST_USER_ID));
    read_back(user, "the update", reporter).await
}

pub(super) async fn remove_field<W: Write>(
    user: &Reference<'_>,
    reporter: &mut Reporter<W>,
) -> Result<(), DatabaseError> {
    user.child(REMOVED_FIELD).remove().await?;
    reporter.line(format!(
        "Field '{}' removed from user '{}'.",
        REMOVED_FIELD, TEST_USER_ID
    ));
    read_back(user, &format!("removing '{}'", REMOVED_FIELD), reporter).await
}

pub(super) async fn remove_user<W: Write>(
    user: &Reference<'_>,
    reporter: &mut Reporter<W>,
) -> Result<(), DatabaseError> {
    user.remove().await?;
    reporter.line(format!("User '{}' removed completely.", TEST_USER_ID));
    Ok(())
}

pub(super) async fn remove_transaction<W: Write>(
    transactions: &Reference<'_>,
    key: &str,
    reporter: &mut Reporter<W>,
) -> Result<(), DatabaseError> {
    transactions.child(key).remove().await?;
    reporter.line(format!("Transaction with key '{}' removed.", key));
    Ok(())
}

/// Runs the eight database checks in order. A failing check is reported and recorded, and
/// the next one still runs.
pub async fn run_crud_probe<W: Write>(
    db: &FirebaseDatabase,
    options: &ProbeOptions,
    reporter: &mut Reporter<W>,
) -> Vec<StepReport> {
    reporter.section("Testing Realtime Database CRUD operations");

    let user = db.child(USERS).child(TEST_USER_ID);
    let transactions = db.child(TRANSACTIONS);
    let mut steps = Vec::with_capacity(8);

    reporter.section("Creating a user under a chosen key (set)");
    let result = set_user(&user, reporter).await;
    steps.push(finish(reporter, CrudStep::SetUser, result));

    reporter.section("Adding a transaction under a generated key (push)");
    let pushed = push_transaction(&transactions, reporter).await;
    let transaction_key = pushed.as_ref().ok().cloned();
    steps.push(finish(reporter, CrudStep::PushTransaction, pushed.map(|_| ())));

    reporter.section(&format!("Reading user '{}'", TEST_USER_ID));
    let result = read_user(&user, reporter).await;
    steps.push(finish(reporter, CrudStep::ReadUser, result));

    reporter.section("Reading all transactions");
    let result = read_transactions(&transactions, reporter).await;
    steps.push(finish(reporter, CrudStep::ReadTransactions, result));

    reporter.section(&format!("Updating the balance of user '{}'", TEST_USER_ID));
    let result = update_user(&user, reporter).await;
    steps.push(finish(reporter, CrudStep::UpdateUser, result));

    reporter.section(&format!(
        "Removing field '{}' from user '{}'",
        REMOVED_FIELD, TEST_USER_ID
    ));
    let result = remove_field(&user, reporter).await;
    steps.push(finish(reporter, CrudStep::RemoveField, result));

    reporter.section(&format!("Removing user '{}'", TEST_USER_ID));
    if options.remove_test_user {
        let result = remove_user(&user, reporter).await;
        steps.push(finish(reporter, CrudStep::RemoveUser, result));
    } else {
        steps.push(skip(
            reporter,
            CrudStep::RemoveUser,
            "Skipped: set SMOKE_REMOVE_TEST_USER=true to delete the test user.",
        ));
    }

    reporter.section("Removing the transaction added under a generated key");
    match transaction_key {
        Some(key) => {
            let result = remove_transaction(&transactions, &key, reporter).await;
            steps.push(finish(reporter, CrudStep::RemoveTransaction, result));
        }
        None => steps.push(skip(
            reporter,
            CrudStep::RemoveTransaction,
            "No transaction key was generated in this run; nothing to remove.",
        )),
    }

    steps
}
