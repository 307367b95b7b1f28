// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Default subtree growth for every component kind.
//!
//! | Kind | Grows | At |
//! |---|---|---|
//! | Neuron | Soma | same position |
//! | Soma | AxonHillock, DendriteBranch | +1, −1 per axis |
//! | AxonHillock | Axon | +1 per axis |
//! | Axon | AxonBouton | +1 per axis |
//! | AxonBranch | Axon | layered sibling offset |
//! | AxonBouton | SynapticGap | +1 per axis |
//! | DendriteBranch | Dendrite | layered sibling offset |
//! | Dendrite | DendriteBouton | −1 per axis |
//!
//! Bouton, gap, effector and receptor are leaves. Extra siblings always go to
//! `parent + layered_fibonacci_sphere_point(n + 1, n + 1)`, `n` being the
//! number of children of that kind the parent already owns.

use tracing::trace;

use crate::arena::ComponentArena;
use crate::context::GrowthContext;
use crate::types::{
    layered_fibonacci_sphere_point, ComponentError, ComponentKind, ComponentResult, EntityKey,
    Position,
};

const FORWARD: Position = Position::uniform(1.0);
const BACKWARD: Position = Position::uniform(-1.0);

impl ComponentArena {
    /// Grow `key`'s default subtree. Idempotent: only the first call grows.
    pub fn initialise(&mut self, ctx: &GrowthContext, key: EntityKey) -> ComponentResult<()> {
        let component = self.get(key)?;
        if component.is_initialised() {
            return Ok(());
        }
        let kind = component.kind();
        let at = component.position();

        match kind {
            ComponentKind::Neuron => {
                self.grow_child(ctx, key, ComponentKind::Soma, at)?;
            }
            ComponentKind::Soma => {
                self.grow_child(ctx, key, ComponentKind::AxonHillock, at + FORWARD)?;
                self.grow_child(ctx, key, ComponentKind::DendriteBranch, at + BACKWARD)?;
            }
            ComponentKind::AxonHillock => {
                self.grow_child(ctx, key, ComponentKind::Axon, at + FORWARD)?;
            }
            ComponentKind::Axon => {
                self.grow_child(ctx, key, ComponentKind::AxonBouton, at + FORWARD)?;
            }
            ComponentKind::AxonBranch => {
                self.grow_sibling(ctx, key, ComponentKind::Axon)?;
            }
            ComponentKind::AxonBouton => {
                self.grow_child(ctx, key, ComponentKind::SynapticGap, at + FORWARD)?;
            }
            ComponentKind::DendriteBranch => {
                self.grow_sibling(ctx, key, ComponentKind::Dendrite)?;
            }
            ComponentKind::Dendrite => {
                self.grow_child(ctx, key, ComponentKind::DendriteBouton, at + BACKWARD)?;
            }
            ComponentKind::DendriteBouton
            | ComponentKind::SynapticGap
            | ComponentKind::SensoryReceptor
            | ComponentKind::Effector => {}
        }

        self.get_mut(key)?.initialised = true;
        Ok(())
    }

    fn grow_child(
        &mut self,
        ctx: &GrowthContext,
        parent: EntityKey,
        kind: ComponentKind,
        at: Position,
    ) -> ComponentResult<EntityKey> {
        let child = self.create(ctx, kind, at);
        self.connect(parent, child)?;
        self.initialise(ctx, child)?;
        trace!(target: "neurogen-components", "Grew {} {} at {}", kind, child, at);
        Ok(child)
    }

    /// Grow one more child of `kind` under `parent` at the next layered
    /// sibling offset.
    pub fn grow_sibling(
        &mut self,
        ctx: &GrowthContext,
        parent: EntityKey,
        kind: ComponentKind,
    ) -> ComponentResult<EntityKey> {
        let siblings = self.children_of_kind(parent, kind)?.len();
        let offset = layered_fibonacci_sphere_point(siblings + 1, siblings + 1)?;
        let at = self.get(parent)?.position() + offset;

        let child = self.create(ctx, kind, at);
        self.attach(parent, child)?;
        self.initialise(ctx, child)?;
        trace!(
            target: "neurogen-components",
            "Grew sibling #{} {} {} at {}",
            siblings + 1,
            kind,
            child,
            at
        );
        Ok(child)
    }

    fn require_kind(&self, key: EntityKey, expected: ComponentKind) -> ComponentResult<()> {
        let found = self.get(key)?.kind();
        if found != expected {
            return Err(ComponentError::WrongKind {
                expected: expected.as_str(),
                found,
            });
        }
        Ok(())
    }

    pub fn add_dendrite_branch(&mut self, ctx: &GrowthContext, soma: EntityKey) -> ComponentResult<EntityKey> {
        self.require_kind(soma, ComponentKind::Soma)?;
        self.grow_sibling(ctx, soma, ComponentKind::DendriteBranch)
    }

    pub fn add_axon_branch(&mut self, ctx: &GrowthContext, axon: EntityKey) -> ComponentResult<EntityKey> {
        self.require_kind(axon, ComponentKind::Axon)?;
        self.grow_sibling(ctx, axon, ComponentKind::AxonBranch)
    }

    pub fn add_axon(&mut self, ctx: &GrowthContext, branch: EntityKey) -> ComponentResult<EntityKey> {
        self.require_kind(branch, ComponentKind::AxonBranch)?;
        self.grow_sibling(ctx, branch, ComponentKind::Axon)
    }

    pub fn add_dendrite(&mut self, ctx: &GrowthContext, branch: EntityKey) -> ComponentResult<EntityKey> {
        self.require_kind(branch, ComponentKind::DendriteBranch)?;
        self.grow_sibling(ctx, branch, ComponentKind::Dendrite)
    }

    /// Give a sensory receptor one more transmitting gap
    pub fn add_receptor_gap(&mut self, ctx: &GrowthContext, receptor: EntityKey) -> ComponentResult<EntityKey> {
        self.require_kind(receptor, ComponentKind::SensoryReceptor)?;
        self.grow_sibling(ctx, receptor, ComponentKind::SynapticGap)
    }
}
