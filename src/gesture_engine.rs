use std::collections::VecDeque;

use crate::{
    clock::MusicalClock,
    error::{GlowmoteError, GlowmoteResult},
    frame::ChannelPatch,
    gesture::{BlendType, GestureEval, GestureRegistry, GestureTick, GestureTuning, MotionContext},
};

// One live gesture instance. Progress is derived from elapsed time only.
#[derive(Clone, Debug)]
struct ActiveGesture {
    name: String,
    blend: BlendType,
    conflict_group: Option<String>,
    duration_ms: f64,
    elapsed_ms: f64,
    previous_progress: f64,
    tuning: GestureTuning,
    eval: GestureEval,
}

impl ActiveGesture {
    fn progress(&self) -> f64 {
        if self.duration_ms <= 0.0 {
            1.0
        } else {
            (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
        }
    }
}

/// One gesture's contribution to the current frame, tagged with its
/// declared blend semantics.
#[derive(Clone, Debug, PartialEq)]
pub struct GesturePatch {
    pub name: String,
    pub blend: BlendType,
    pub patch: ChannelPatch,
}

#[derive(Clone, Debug, Default)]
pub struct GestureUpdate {
    pub patches: Vec<GesturePatch>, // trigger order
    pub started: Vec<String>,       // chain-started this update
    pub ended: Vec<String>,         // reached progress 1, retired
}

/// Lifecycle manager for concurrently active gestures.
#[derive(Clone, Debug)]
pub struct GestureEngine {
    registry: GestureRegistry,
    active: Vec<ActiveGesture>,
    chain: VecDeque<(String, GestureTuning)>,
    chain_head: Option<String>,
}

impl GestureEngine {
    pub fn new(registry: GestureRegistry) -> Self {
        Self {
            registry,
            active: Vec::new(),
            chain: VecDeque::new(),
            chain_head: None,
        }
    }

    pub fn registry(&self) -> &GestureRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut GestureRegistry {
        &mut self.registry
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.iter().any(|g| g.name == name)
    }

    pub fn active_names(&self) -> Vec<&str> {
        self.active.iter().map(|g| g.name.as_str()).collect()
    }

    /// Starts a gesture. Unknown names are an error result. Musical
    /// durations resolve against the current tempo once, here; re-triggering
    /// an active gesture restarts it from progress 0.
    pub fn trigger(
        &mut self,
        name: &str,
        tuning: GestureTuning,
        clock: &MusicalClock,
    ) -> GlowmoteResult<()> {
        let def = self
            .registry
            .get(name)
            .ok_or_else(|| GlowmoteError::gesture(format!("unknown gesture '{name}'")))?
            .clone();

        let duration_ms = def.duration.resolve_ms(clock.bpm(), clock.beats_per_bar());

        let had_instance = self.active.iter().any(|g| g.name == def.name);
        if had_instance {
            tracing::debug!(gesture = %def.name, "retrigger restarts progress");
            self.active.retain(|g| g.name != def.name);
        }

        // An incoming override preempts whatever holds its conflict group.
        if def.blend == BlendType::Override {
            if let Some(group) = &def.conflict_group {
                self.active.retain(|g| {
                    let evicted = g.conflict_group.as_deref() == Some(group.as_str());
                    if evicted {
                        tracing::debug!(gesture = %g.name, group = %group, "preempted");
                    }
                    !evicted
                });
            }
        }

        self.active.push(ActiveGesture {
            name: def.name.clone(),
            blend: def.blend,
            conflict_group: def.conflict_group.clone(),
            duration_ms,
            elapsed_ms: 0.0,
            previous_progress: 0.0,
            tuning,
            eval: def.eval,
        });
        Ok(())
    }

    /// Schedules gestures back to back; each entry triggers on the previous
    /// one's completion. A new chain aborts the queued one. Names are
    /// validated up front.
    pub fn chain(
        &mut self,
        entries: Vec<(String, GestureTuning)>,
        clock: &MusicalClock,
    ) -> GlowmoteResult<()> {
        for (name, _) in &entries {
            if self.registry.get(name).is_none() {
                return Err(GlowmoteError::gesture(format!(
                    "chain references unknown gesture '{name}'"
                )));
            }
        }
        self.chain.clear();
        self.chain_head = None;

        let mut iter = entries.into_iter();
        let Some((first, tuning)) = iter.next() else {
            return Ok(());
        };
        self.trigger(&first, tuning, clock)?;
        self.chain_head = Some(first);
        self.chain.extend(iter);
        Ok(())
    }

    pub fn clear_all(&mut self) {
        self.active.clear();
        self.chain.clear();
        self.chain_head = None;
    }

    /// Advances every active gesture, evaluates patches in trigger order,
    /// retires completed ones and advances the chain.
    pub fn update(
        &mut self,
        dt_ms: f64,
        ctx: &MotionContext,
        clock: &MusicalClock,
    ) -> GestureUpdate {
        let dt = if dt_ms.is_finite() && dt_ms > 0.0 { dt_ms } else { 0.0 };
        let mut out = GestureUpdate::default();

        for g in &mut self.active {
            g.elapsed_ms += dt;
            let progress = g.progress();
            let tick = GestureTick {
                progress,
                previous: g.previous_progress,
            };
            let patch = (g.eval)(tick, &g.tuning, ctx);
            g.previous_progress = progress;
            out.patches.push(GesturePatch {
                name: g.name.clone(),
                blend: g.blend,
                patch,
            });
        }

        let ended = &mut out.ended;
        self.active.retain(|g| {
            let done = g.progress() >= 1.0;
            if done {
                ended.push(g.name.clone());
            }
            !done
        });

        if let Some(head) = self.chain_head.clone() {
            if out.ended.contains(&head) {
                self.chain_head = None;
                if let Some((next, tuning)) = self.chain.pop_front() {
                    match self.trigger(&next, tuning, clock) {
                        Ok(()) => {
                            out.started.push(next.clone());
                            self.chain_head = Some(next);
                        }
                        Err(err) => {
                            tracing::warn!(%err, "chain advance failed, dropping rest of chain");
                            self.chain.clear();
                        }
                    }
                }
            }
        }

        out
    }

    // True while any override gesture is active.
    pub fn override_active(&self) -> bool {
        self.active.iter().any(|g| g.blend == BlendType::Override)
    }
}
