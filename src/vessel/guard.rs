/*
    Ascent GNC, closed-loop launch and maneuver guidance
    Copyright (C) 2025-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use super::Vessel;
use std::ops::{Deref, DerefMut};

/// Exclusive access to a vessel while the guidance is commanding it.
///
/// Unless released, dropping the guard cuts the throttle and releases the attitude control, so
/// that an error or an early return never leaves the engines burning.
pub struct ControlGuard<'a, V: Vessel + ?Sized> {
    vessel: &'a mut V,
    armed: bool,
}

impl<'a, V: Vessel + ?Sized> ControlGuard<'a, V> {
    pub fn new(vessel: &'a mut V) -> Self {
        Self {
            vessel,
            armed: true,
        }
    }

    /// Hand the vessel back without touching its controls.
    pub fn release(mut self) {
        self.armed = false;
    }
}

impl<V: Vessel + ?Sized> Deref for ControlGuard<'_, V> {
    type Target = V;

    fn deref(&self) -> &Self::Target {
        self.vessel
    }
}

impl<V: Vessel + ?Sized> DerefMut for ControlGuard<'_, V> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.vessel
    }
}

impl<V: Vessel + ?Sized> Drop for ControlGuard<'_, V> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        debug!("control guard dropped while armed: zeroing throttle and releasing attitude");
        if let Err(e) = self.vessel.set_throttle(0.0) {
            warn!("could not zero the throttle on exit: {e}");
        }
        if let Err(e) = self.vessel.disengage_attitude() {
            warn!("could not disengage the attitude control on exit: {e}");
        }
    }
}
