// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Synaptic endpoints and proximity-based association

pub mod association;
pub mod envelope;

pub use association::{
    associate, associate_neurons, guidance_vector, EndpointOwner, GapEndpoint,
    ReceivingEndpoint, SynapseLink, SynapseReceiver, SynapseTransmitter,
};
pub use envelope::Envelope;
