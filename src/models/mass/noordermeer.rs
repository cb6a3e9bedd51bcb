//! Noordermeer (2008) flattened rotation curves.
//!
//! Circular velocities of oblate Sersic spheroids are tabulated on a grid of
//! Sersic index and inverse axis ratio. A profile is matched to the nearest
//! tabulated pair (no interpolation between tables) and its curve is rescaled
//! from the table's reference mass and effective radius.
//!
//! Tables are supplied through the [`NoordermeerTables`] trait so that the
//! model has no filesystem dependency.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::error::{GalkinError, Result};
use crate::utils::interp_extrapolate;

/// Tabulated inverse axis ratios
pub const NOORDERMEER_INVQ: [f64; 10] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 10.0, 20.0, 100.0];

const N_MIN: f64 = 0.5;
const N_STEP: f64 = 0.1;
const N_COUNT: usize = 76;

/// One tabulated rotation curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationCurveTable {
    /// Radii [kpc], increasing
    pub rad: Vec<f64>,
    /// Circular velocity [km/s]
    pub vcirc: Vec<f64>,
    /// Effective radius of the tabulated profile [kpc]
    pub re: f64,
    /// Total mass of the tabulated profile [Msun]
    pub mass: f64,
}

/// Provider of flattened rotation curves
pub trait NoordermeerTables: Debug + Send + Sync {
    /// Table for a grid point; `n` and `invq` are already snapped to the grid
    fn lookup(&self, n: f64, invq: f64) -> Result<Arc<RotationCurveTable>>;
}

/// Grid point nearest to `(n, invq)`
pub fn nearest_table_key(n: f64, invq: f64) -> (f64, f64) {
    let idx = ((n - N_MIN) / N_STEP).round().clamp(0.0, (N_COUNT - 1) as f64);
    let nearest_n = N_MIN + idx * N_STEP;

    let mut nearest_q = NOORDERMEER_INVQ[0];
    for &q in NOORDERMEER_INVQ.iter() {
        if (q - invq).abs() < (nearest_q - invq).abs() {
            nearest_q = q;
        }
    }
    (nearest_n, nearest_q)
}

/// Flattened circular velocity of a Sersic profile
pub fn apply_noord_flat(
    r: &Array1<f64>,
    r_eff: f64,
    mass: f64,
    n: f64,
    invq: f64,
    tables: &dyn NoordermeerTables,
) -> Result<Array1<f64>> {
    let (nearest_n, nearest_q) = nearest_table_key(n, invq);
    let table = tables.lookup(nearest_n, nearest_q)?;

    let scale = (mass / table.mass).sqrt() * (table.re / r_eff).sqrt();
    Ok(r.mapv(|r| interp_extrapolate(&table.rad, &table.vcirc, r.abs() / r_eff * table.re) * scale))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TableEntry {
    n: f64,
    invq: f64,
    table: RotationCurveTable,
}

/// Tables held in memory, keyed by grid point
#[derive(Debug, Clone, Default)]
pub struct InMemoryNoordermeerTables {
    tables: HashMap<(i64, i64), Arc<RotationCurveTable>>,
}

fn table_key(n: f64, invq: f64) -> (i64, i64) {
    ((n * 10.0).round() as i64, invq.round() as i64)
}

impl InMemoryNoordermeerTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a table under the grid point nearest to `(n, invq)`
    pub fn insert(&mut self, n: f64, invq: f64, table: RotationCurveTable) {
        let (n, invq) = nearest_table_key(n, invq);
        self.tables.insert(table_key(n, invq), Arc::new(table));
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Load from a JSON array of `{"n", "invq", "table"}` records
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<TableEntry> = serde_json::from_str(json)?;
        let mut tables = Self::new();
        for entry in entries {
            tables.insert(entry.n, entry.invq, entry.table);
        }
        Ok(tables)
    }
}

impl NoordermeerTables for InMemoryNoordermeerTables {
    fn lookup(&self, n: f64, invq: f64) -> Result<Arc<RotationCurveTable>> {
        self.tables
            .get(&table_key(n, invq))
            .cloned()
            .ok_or_else(|| GalkinError::MissingCollaborator(format!("no Noordermeer table for n={:.1}, invq={}", n, invq)))
    }
}
