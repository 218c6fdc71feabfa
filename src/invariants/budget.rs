// src/invariants/budget.rs

//! Invariants across the union-budget artifacts.
//!
//! Amounts are in Rs crore; a one-crore absolute tolerance absorbs rounding
//! in the source tables. State transfers use a relative bound because the
//! national total runs to lakhs of crore.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::models::ArtifactSet;

use super::{
    Invariant, InvariantSet, Tolerance, TreeNode, check_leaf_sum, check_matching_amounts,
    check_percent_sum, check_regional_total, check_tree_total,
};

pub const TREEMAP: &str = "treemap.json";
pub const EXPENDITURE: &str = "expenditure.json";
pub const SCHEMES: &str = "schemes.json";
pub const RECEIPTS: &str = "receipts.json";
pub const STATEWISE: &str = "statewise.json";

// Typed views: only the fields the checks read.

#[derive(Debug, Deserialize)]
struct Treemap {
    root: TreeNode,
}

#[derive(Debug, Deserialize)]
struct Expenditure {
    total: f64,
    ministries: Vec<Ministry>,
}

#[derive(Debug, Deserialize)]
struct Ministry {
    #[serde(default)]
    schemes: Vec<SchemeAmount>,
}

#[derive(Debug, Deserialize)]
struct SchemeAmount {
    id: String,
    amount: f64,
}

#[derive(Debug, Deserialize)]
struct Schemes {
    schemes: Vec<Scheme>,
}

#[derive(Debug, Deserialize)]
struct Scheme {
    id: String,
    allocation: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Receipts {
    total: f64,
    categories: Vec<ReceiptCategory>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptCategory {
    amount: f64,
    percent_of_total: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statewise {
    total_transfers: f64,
    states: Vec<StateTransfer>,
}

#[derive(Debug, Deserialize)]
struct StateTransfer {
    transfer: f64,
}

/// Treemap leaves add up to the expenditure total.
pub struct TreemapMatchesExpenditure;

impl Invariant for TreemapMatchesExpenditure {
    fn name(&self) -> &str {
        "treemap sum == expenditure total"
    }

    fn check(&self, artifacts: &ArtifactSet) -> Vec<String> {
        let treemap = artifacts.decode::<Treemap>(TREEMAP);
        let expenditure = artifacts.decode::<Expenditure>(EXPENDITURE);
        match (treemap, expenditure) {
            (Ok(treemap), Ok(expenditure)) => check_tree_total(
                "Treemap sum vs expenditure total",
                &treemap.root,
                expenditure.total,
                Tolerance::Absolute(1.0),
            ),
            (treemap, expenditure) => treemap.err().into_iter().chain(expenditure.err()).collect(),
        }
    }
}

/// Scheme allocations agree with the scheme amounts listed under ministries.
pub struct SchemesMatchExpenditure;

impl Invariant for SchemesMatchExpenditure {
    fn name(&self) -> &str {
        "scheme allocations match expenditure"
    }

    fn check(&self, artifacts: &ArtifactSet) -> Vec<String> {
        let schemes = artifacts.decode::<Schemes>(SCHEMES);
        let expenditure = artifacts.decode::<Expenditure>(EXPENDITURE);
        let (schemes, expenditure) = match (schemes, expenditure) {
            (Ok(schemes), Ok(expenditure)) => (schemes, expenditure),
            (schemes, expenditure) => {
                return schemes.err().into_iter().chain(expenditure.err()).collect();
            }
        };

        // Later ministries win on a repeated scheme id
        let reference: BTreeMap<String, f64> = expenditure
            .ministries
            .into_iter()
            .flat_map(|m| m.schemes)
            .map(|s| (s.id, s.amount))
            .collect();

        check_matching_amounts(
            "Scheme",
            schemes.schemes.iter().map(|s| (s.id.as_str(), s.allocation)),
            &reference,
            Tolerance::Absolute(1.0),
        )
    }
}

/// Receipt category shares add up to roughly 100%.
pub struct ReceiptPercentages;

impl Invariant for ReceiptPercentages {
    fn name(&self) -> &str {
        "receipt percentages sum to 100"
    }

    fn check(&self, artifacts: &ArtifactSet) -> Vec<String> {
        match artifacts.decode::<Receipts>(RECEIPTS) {
            Ok(receipts) => {
                let percents: Vec<f64> = receipts.categories.iter().map(|c| c.percent_of_total).collect();
                check_percent_sum("Receipt percentOfTotal sum", &percents, Tolerance::Absolute(1.5))
            }
            Err(error) => vec![error],
        }
    }
}

/// Receipt category amounts add up to the receipts total.
pub struct ReceiptAmounts;

impl Invariant for ReceiptAmounts {
    fn name(&self) -> &str {
        "receipt amounts sum to total"
    }

    fn check(&self, artifacts: &ArtifactSet) -> Vec<String> {
        match artifacts.decode::<Receipts>(RECEIPTS) {
            Ok(receipts) => {
                let amounts: Vec<f64> = receipts.categories.iter().map(|c| c.amount).collect();
                check_leaf_sum(
                    "Receipt amounts vs total",
                    &amounts,
                    receipts.total,
                    Tolerance::Absolute(1.0),
                )
            }
            Err(error) => vec![error],
        }
    }
}

/// State transfers add up to the reported national transfers.
pub struct StateTransfersMatchTotal;

impl Invariant for StateTransfersMatchTotal {
    fn name(&self) -> &str {
        "state transfers sum to totalTransfers"
    }

    fn check(&self, artifacts: &ArtifactSet) -> Vec<String> {
        match artifacts.decode::<Statewise>(STATEWISE) {
            Ok(statewise) => {
                let transfers: Vec<f64> = statewise.states.iter().map(|s| s.transfer).collect();
                check_regional_total(
                    "State transfers vs totalTransfers",
                    &transfers,
                    statewise.total_transfers,
                    Tolerance::Relative { percent: 0.5 },
                )
            }
            Err(error) => vec![error],
        }
    }
}

/// Every union-budget cross-file check.
pub fn budget_invariants() -> InvariantSet {
    InvariantSet::new()
        .with(TreemapMatchesExpenditure)
        .with(SchemesMatchExpenditure)
        .with(ReceiptPercentages)
        .with(ReceiptAmounts)
        .with(StateTransfersMatchTotal)
}
