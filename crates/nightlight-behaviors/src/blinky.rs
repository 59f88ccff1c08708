// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

use nightlight_config::NightlightConfig;

use crate::Ctx;

/// Blinks an output for a fixed time, then finishes
#[derive(Debug, Clone)]
pub struct BlinkyLight {
    pin: u8,
    /// Output is active-low
    inverted: bool,
    duration_ms: u64,
    toggle_ms: u64,
    expires_at: u64,
    lit: bool,
}

impl BlinkyLight {
    pub fn new(pin: u8, inverted: bool, duration_ms: u64, toggle_ms: u64) -> Self {
        Self {
            pin,
            inverted,
            duration_ms,
            toggle_ms,
            expires_at: 0,
            lit: false,
        }
    }

    pub fn from_config(config: &NightlightConfig) -> Self {
        Self::new(
            config.outputs.led_pin,
            config.outputs.led_inverted,
            config.timing.blink_duration_ms,
            config.timing.blink_toggle_ms,
        )
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    fn drive(&self, ctx: &mut Ctx<'_>) {
        ctx.set_output(self.pin, self.lit != self.inverted);
    }

    pub fn start(&mut self, ctx: &mut Ctx<'_>) {
        self.lit = true;
        self.drive(ctx);
        self.expires_at = ctx.now() + self.duration_ms;
        ctx.set_timeout(self.toggle_ms);
    }

    pub fn on_timeout(&mut self, ctx: &mut Ctx<'_>) {
        if ctx.now() >= self.expires_at {
            self.lit = false;
            self.drive(ctx);
            ctx.finish();
            return;
        }
        self.lit = !self.lit;
        self.drive(ctx);
        ctx.set_timeout(self.toggle_ms);
    }
}
