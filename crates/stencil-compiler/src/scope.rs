//! Per-invocation call scope.
//!
//! A [`CallScope`] carries the compilation-wide parameters of one top-level
//! compile or render call (message bundle, locale, global text direction) to
//! every pass and directive that runs during that call. A frame is opened with
//! [`CallScope::enter`], filled once with [`CallScope::seed`], read with
//! [`CallScope::get`], and closed when the returned [`ScopeGuard`] drops.

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::bidi::BidiGlobalDir;
use crate::error::{CompileError, Result};
use crate::msgs::MsgBundle;

/// Named slots of a call scope frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    MsgBundle,
    LocaleString,
    BidiGlobalDir,
}

impl Slot {
    pub fn name(&self) -> &'static str {
        match self {
            Slot::MsgBundle => "MsgBundle",
            Slot::LocaleString => "LocaleString",
            Slot::BidiGlobalDir => "BidiGlobalDir",
        }
    }
}

/// A value bound to one slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue {
    /// The translated messages, or `None` to use source messages.
    MsgBundle(Option<Arc<MsgBundle>>),
    /// Locale of the bundle, if there is one.
    LocaleString(Option<String>),
    BidiGlobalDir(BidiGlobalDir),
}

impl SlotValue {
    pub fn slot(&self) -> Slot {
        match self {
            SlotValue::MsgBundle(_) => Slot::MsgBundle,
            SlotValue::LocaleString(_) => Slot::LocaleString,
            SlotValue::BidiGlobalDir(_) => Slot::BidiGlobalDir,
        }
    }
}

type Frame = HashMap<Slot, SlotValue>;

#[derive(Debug, Default)]
struct ScopeState {
    frame: Option<Frame>,
    /// Bumped on every `enter`; a guard only closes the frame it opened.
    generation: u64,
}

/// Scoped parameters for one call at a time.
///
/// At most one frame may be open. A second `enter` before the first frame
/// closes fails with [`CompileError::ScopeReentry`], so a shared instance can
/// never leak one call's seeds into another call's frame.
#[derive(Debug, Default)]
pub struct CallScope {
    state: Mutex<ScopeState>,
}

impl CallScope {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ScopeState> {
        // A panic inside a frame must not stop the frame from being closed.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a frame. The frame closes when the guard is dropped, on every
    /// exit path.
    pub fn enter(&self) -> Result<ScopeGuard<'_>> {
        let mut state = self.lock();
        if state.frame.is_some() {
            return Err(CompileError::ScopeReentry);
        }
        state.generation += 1;
        state.frame = Some(Frame::new());
        tracing::trace!(generation = state.generation, "call scope entered");
        Ok(ScopeGuard {
            scope: self,
            generation: state.generation,
        })
    }

    /// Bind a slot in the open frame. Each slot can be bound once per frame.
    pub fn seed(&self, value: SlotValue) -> Result<()> {
        let slot = value.slot();
        let mut state = self.lock();
        let frame = state
            .frame
            .as_mut()
            .ok_or(CompileError::ScopeNotEntered(slot.name()))?;
        if frame.contains_key(&slot) {
            return Err(CompileError::DuplicateSeed(slot.name()));
        }
        frame.insert(slot, value);
        Ok(())
    }

    /// Read a previously seeded slot of the open frame.
    pub fn get(&self, slot: Slot) -> Result<SlotValue> {
        self.lock()
            .frame
            .as_ref()
            .and_then(|frame| frame.get(&slot).cloned())
            .ok_or(CompileError::UnseededSlot(slot.name()))
    }

    /// Close the open frame, if any, discarding its bindings.
    pub fn exit(&self) {
        if self.lock().frame.take().is_some() {
            tracing::trace!("call scope exited");
        }
    }

    /// Close the frame only if it is still the one opened as `generation`.
    fn exit_generation(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation == generation && state.frame.take().is_some() {
            tracing::trace!(generation, "call scope exited");
        }
    }

    pub fn is_active(&self) -> bool {
        self.lock().frame.is_some()
    }

    pub fn msg_bundle(&self) -> Result<Option<Arc<MsgBundle>>> {
        match self.get(Slot::MsgBundle)? {
            SlotValue::MsgBundle(bundle) => Ok(bundle),
            _ => Err(CompileError::UnseededSlot(Slot::MsgBundle.name())),
        }
    }

    pub fn locale(&self) -> Result<Option<String>> {
        match self.get(Slot::LocaleString)? {
            SlotValue::LocaleString(locale) => Ok(locale),
            _ => Err(CompileError::UnseededSlot(Slot::LocaleString.name())),
        }
    }

    pub fn bidi_global_dir(&self) -> Result<BidiGlobalDir> {
        match self.get(Slot::BidiGlobalDir)? {
            SlotValue::BidiGlobalDir(dir) => Ok(dir),
            _ => Err(CompileError::UnseededSlot(Slot::BidiGlobalDir.name())),
        }
    }

    /// Seed the parameters every backend shares.
    ///
    /// `bidi_global_dir` is `1` (ltr), `-1` (rtl), or `0` to derive the
    /// direction from the bundle's locale.
    pub fn seed_shared_params(
        &self,
        msg_bundle: Option<Arc<MsgBundle>>,
        bidi_global_dir: i32,
    ) -> Result<()> {
        let locale = msg_bundle.as_ref().map(|b| b.locale().to_string());
        let dir = BidiGlobalDir::resolve(bidi_global_dir, locale.as_deref());
        tracing::debug!(?locale, ?dir, "seeding shared call scope params");

        self.seed(SlotValue::MsgBundle(msg_bundle))?;
        self.seed(SlotValue::LocaleString(locale))?;
        self.seed(SlotValue::BidiGlobalDir(dir))?;
        Ok(())
    }
}

/// An open call scope frame. Dropping the guard closes the frame.
#[derive(Debug)]
pub struct ScopeGuard<'a> {
    scope: &'a CallScope,
    generation: u64,
}

impl Deref for ScopeGuard<'_> {
    type Target = CallScope;

    fn deref(&self) -> &CallScope {
        self.scope
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.scope.exit_generation(self.generation);
    }
}
