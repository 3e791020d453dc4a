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

use crate::guidance::GuidanceError;
use crate::io::ConfigError;
use crate::md::ManeuverError;
use crate::mechanics::MechanicsError;
use crate::vessel::VesselError;
use snafu::prelude::*;

/// Top level error returned by the launch and node execution drivers.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum GncError {
    #[snafu(display("invalid physical inputs: {source}"))]
    Domain { source: MechanicsError },
    #[snafu(display("guidance setup failed: {source}"))]
    Guidance { source: GuidanceError },
    #[snafu(display("maneuver failed: {source}"))]
    Maneuver { source: ManeuverError },
    #[snafu(display("vessel command failed: {source}"))]
    Vessel { source: VesselError },
    #[snafu(display("configuration error: {source}"))]
    Config { source: ConfigError },
}

impl From<MechanicsError> for GncError {
    fn from(source: MechanicsError) -> Self {
        Self::Domain { source }
    }
}

impl From<GuidanceError> for GncError {
    fn from(source: GuidanceError) -> Self {
        Self::Guidance { source }
    }
}

impl From<ManeuverError> for GncError {
    fn from(source: ManeuverError) -> Self {
        Self::Maneuver { source }
    }
}

impl From<VesselError> for GncError {
    fn from(source: VesselError) -> Self {
        Self::Vessel { source }
    }
}

impl From<ConfigError> for GncError {
    fn from(source: ConfigError) -> Self {
        Self::Config { source }
    }
}
