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

use crate::mechanics::MechanicsError;
use crate::vessel::VesselError;
use snafu::prelude::*;

mod planner;
pub use planner::{ManeuverPlan, ManeuverPlanner};

mod executor;
pub use executor::{BurnConfig, BurnExecutor, BurnOutcome, BurnPhase, BurnSession, Completion};

mod session;
pub use session::{AscentSession, AscentStatus, AscentTick};

mod launch;
pub use launch::{execute_node, LaunchConfig, LaunchReport, LaunchSequence, OrbitReport};

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ManeuverError {
    /// There is no maneuver node to execute: the caller may plan one and try again.
    #[snafu(display("nothing to execute: no maneuver node exists"))]
    NothingToExecute,
    #[snafu(display("cannot plan burn: {source}"))]
    Planning { source: MechanicsError },
    #[snafu(display("when {action} the vessel reported {source}"))]
    ManeuverVessel {
        action: &'static str,
        source: VesselError,
    },
}

impl From<MechanicsError> for ManeuverError {
    fn from(source: MechanicsError) -> Self {
        Self::Planning { source }
    }
}
