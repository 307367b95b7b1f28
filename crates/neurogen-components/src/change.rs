// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Immutable snapshot of a component that changed since the last hand-off

use serde::{Deserialize, Serialize};

use crate::types::{ComponentKind, Position};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub kind: ComponentKind,
    pub id: usize,
    pub position: Position,
    pub propagation_rate: f64,
    pub energy_level: f64,
}

impl ChangeRecord {
    /// IDs are only unique per kind, so both are needed to identify a record.
    pub fn key(&self) -> (ComponentKind, usize) {
        (self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_json_shape() {
        let record = ChangeRecord {
            kind: ComponentKind::SynapticGap,
            id: 7,
            position: Position::new(1.0, 0.0, -2.0),
            propagation_rate: 0.5,
            energy_level: 99.0,
        };
        let value = serde_json::to_value(record).unwrap();
        assert_eq!(value["kind"], "SynapticGap");
        assert_eq!(value["id"], 7);
        assert_eq!(value["position"]["z"], -2.0);
        assert_eq!(record.key(), (ComponentKind::SynapticGap, 7));
    }
}
