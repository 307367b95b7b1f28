// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Self-contained component trees: neurons, sensory receptors and effectors

pub mod effector;
pub mod neuron;
pub mod receptor;
pub mod traits;

pub use effector::Effector;
pub use neuron::Neuron;
pub use receptor::{
    Modality, ReceptorTick, SensoryReceptor, StimulusHandle, DEFAULT_SENSITIVITY,
    DEFAULT_THRESHOLD,
};
pub use traits::ComponentTree;
