//! Totals folded from an activity log.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::activities::{ActivityCategory, ActivityEntry, ActivityKind, Scope};
use crate::units::TonnesCo2e;

/// Landfill diversion target for construction waste, percent by mass
pub const WASTE_DIVERSION_TARGET_PCT: f64 = 70.0;

/// Emissions for one scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeTotals {
    pub scope: Scope,
    pub total: TonnesCo2e,
    pub by_category: BTreeMap<ActivityCategory, TonnesCo2e>,
    /// 0 when the grand total is 0
    pub percentage_of_grand_total: f64,
    pub entry_count: usize,
}

impl ScopeTotals {
    fn fold(scope: Scope, entries: &[ActivityEntry]) -> Self {
        let mut by_category = BTreeMap::new();
        let mut total = TonnesCo2e(0.0);
        for entry in entries {
            total += entry.emissions;
            *by_category.entry(entry.category).or_insert(TonnesCo2e(0.0)) += entry.emissions;
        }
        ScopeTotals {
            scope,
            total,
            by_category,
            percentage_of_grand_total: 0.0,
            entry_count: entries.len(),
        }
    }
}

/// Scope 1/2/3 summary for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionsSummary {
    pub scope1: ScopeTotals,
    pub scope2: ScopeTotals,
    pub scope3: ScopeTotals,
    pub grand_total: TonnesCo2e,
}

impl EmissionsSummary {
    pub(crate) fn from_scopes(
        scope1: &[ActivityEntry],
        scope2: &[ActivityEntry],
        scope3: &[ActivityEntry],
    ) -> Self {
        let mut scopes = [
            ScopeTotals::fold(Scope::Scope1, scope1),
            ScopeTotals::fold(Scope::Scope2, scope2),
            ScopeTotals::fold(Scope::Scope3, scope3),
        ];
        let grand_total: TonnesCo2e = scopes.iter().map(|s| s.total).sum();
        if grand_total.0 != 0.0 {
            for s in &mut scopes {
                s.percentage_of_grand_total = s.total.0 / grand_total.0 * 100.0;
            }
        }
        let [scope1, scope2, scope3] = scopes;
        EmissionsSummary {
            scope1,
            scope2,
            scope3,
            grand_total,
        }
    }

    pub fn scope(&self, scope: Scope) -> &ScopeTotals {
        match scope {
            Scope::Scope1 => &self.scope1,
            Scope::Scope2 => &self.scope2,
            Scope::Scope3 => &self.scope3,
        }
    }
}

/// Construction waste kept out of landfill
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WasteDiversion {
    pub total_tonnes: f64,
    pub diverted_tonnes: f64,
    pub diversion_pct: f64,
    pub target_pct: f64,
    pub meets_target: bool,
}

impl WasteDiversion {
    pub(crate) fn from_entries(entries: &[ActivityEntry]) -> Option<Self> {
        let (total, diverted) = entries
            .iter()
            .filter_map(|e| match &e.kind {
                ActivityKind::Waste { method, tonnes } => Some((*method, *tonnes)),
                _ => None,
            })
            .fold((0.0, 0.0), |(total, diverted), (method, tonnes)| {
                let kept = if method.is_diverted() { tonnes } else { 0.0 };
                (total + tonnes, diverted + kept)
            });
        if total <= 0.0 {
            return None;
        }
        let diversion_pct = diverted / total * 100.0;
        Some(WasteDiversion {
            total_tonnes: total,
            diverted_tonnes: diverted,
            diversion_pct,
            target_pct: WASTE_DIVERSION_TARGET_PCT,
            meets_target: diversion_pct >= WASTE_DIVERSION_TARGET_PCT,
        })
    }
}
