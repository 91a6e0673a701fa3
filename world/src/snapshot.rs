//! Versioned JSON encoding of the grid state.

use std::collections::{BTreeMap, VecDeque};

use patient_world_core::{
    CellCoord, EntityId, Guild, GrowthFactor, LimitingFactor, Species, GUILD_COUNT,
    STATE_FORMAT_VERSION,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::{Cell, Entity, GridError, GridState};

/// Failures raised while encoding or decoding a grid state.
#[derive(Debug, Error)]
pub enum StateError {
    /// The payload is not valid JSON or lacks required fields.
    #[error("malformed grid state: {0}")]
    Json(#[from] serde_json::Error),
    /// The payload predates the running format.
    #[error(
        "grid state format version {found} is older than {expected}; run the migration step before loading"
    )]
    OutdatedFormat {
        /// Version found in the payload.
        found: u32,
        /// Version the core understands.
        expected: u32,
    },
    /// The payload was written by a newer core.
    #[error("unsupported grid state format version {found}; expected {expected}")]
    UnsupportedFormat {
        /// Version found in the payload.
        found: u32,
        /// Version the core understands.
        expected: u32,
    },
    /// A producer key does not name a catalog guild.
    #[error("cell {index} names unknown guild `{key}`")]
    UnknownGuild {
        /// Flat index of the offending cell.
        index: usize,
        /// Unrecognised key.
        key: String,
    },
    /// An environmental field is non-finite or outside `[0, 1]`.
    #[error("cell {index} has {field} {value} outside [0, 1]")]
    FieldOutOfRange {
        /// Flat index of the offending cell.
        index: usize,
        /// Name of the field.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// A cell carries no water samples.
    #[error("cell {index} has an empty water history")]
    EmptyWaterHistory {
        /// Flat index of the offending cell.
        index: usize,
    },
    /// A cell carries more water samples than the stored window allows.
    #[error("cell {index} has {len} water samples but the window is {window}")]
    WaterHistoryTooLong {
        /// Flat index of the offending cell.
        index: usize,
        /// Samples recorded for the cell.
        len: usize,
        /// Stored history window.
        window: usize,
    },
    /// An entity stands outside the grid.
    #[error("entity {id} at ({x}, {y}) lies outside the grid")]
    EntityOutOfBounds {
        /// Entity id.
        id: u32,
        /// Recorded column.
        x: u32,
        /// Recorded row.
        y: u32,
    },
    /// Two entities share an id.
    #[error("entity id {0} appears more than once")]
    DuplicateEntity(u32),
    /// The allocator would hand out an id that is already live.
    #[error("next entity id {next} does not exceed live id {live}")]
    StaleAllocator {
        /// Stored allocator value.
        next: u32,
        /// Largest live id.
        live: u32,
    },
    /// Dimensions and cells disagree.
    #[error(transparent)]
    Grid(#[from] GridError),
}

#[derive(Deserialize)]
struct VersionProbe {
    #[serde(default)]
    version: u32,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StateDocument {
    version: u32,
    day: u64,
    width: u32,
    height: u32,
    cells: Vec<CellDocument>,
    entities: Vec<EntityDocument>,
    next_entity_id: u32,
    #[serde(default = "default_window")]
    water_window: usize,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CellDocument {
    producers: BTreeMap<String, u32>,
    water: f64,
    fertility: f64,
    temperature: f64,
    water_history: Vec<f64>,
    #[serde(default)]
    limiting_factor: Option<GrowthFactor>,
    #[serde(default)]
    limiting_value: Option<f64>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct EntityDocument {
    id: u32,
    #[serde(rename = "type")]
    species: Species,
    x: u32,
    y: u32,
    hunger: u32,
    age: u32,
}

impl GridState {
    /// Encodes the state as canonical JSON.
    pub fn to_json(&self) -> Result<String, StateError> {
        Ok(serde_json::to_string(&self.document())?)
    }

    /// Hex SHA-256 of the canonical JSON encoding.
    pub fn digest(&self) -> Result<String, StateError> {
        let bytes = serde_json::to_vec(&self.document())?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    /// Decodes a state, rejecting payloads from any other format version.
    pub fn from_json(contents: &str) -> Result<Self, StateError> {
        let probe: VersionProbe = serde_json::from_str(contents)?;
        if probe.version < STATE_FORMAT_VERSION {
            return Err(StateError::OutdatedFormat {
                found: probe.version,
                expected: STATE_FORMAT_VERSION,
            });
        }
        if probe.version > STATE_FORMAT_VERSION {
            return Err(StateError::UnsupportedFormat {
                found: probe.version,
                expected: STATE_FORMAT_VERSION,
            });
        }

        let document: StateDocument = serde_json::from_str(contents)?;
        let state = Self::from_document(document)?;
        debug!(
            width = state.width,
            height = state.height,
            day = state.day,
            entities = state.entity_count(),
            "decoded grid state"
        );
        Ok(state)
    }

    fn document(&self) -> StateDocument {
        StateDocument {
            version: STATE_FORMAT_VERSION,
            day: self.day,
            width: self.width,
            height: self.height,
            cells: self.cells.iter().map(encode_cell).collect(),
            entities: self
                .entities
                .values()
                .map(|entity| EntityDocument {
                    id: entity.id.get(),
                    species: entity.species,
                    x: entity.cell.x(),
                    y: entity.cell.y(),
                    hunger: entity.hunger,
                    age: entity.age,
                })
                .collect(),
            next_entity_id: self.next_entity_id,
            water_window: self.water_window,
        }
    }

    fn from_document(document: StateDocument) -> Result<Self, StateError> {
        let window = document.water_window.max(1);
        let mut cells = Vec::with_capacity(document.cells.len());
        for (index, cell) in document.cells.into_iter().enumerate() {
            cells.push(decode_cell(index, cell, window)?);
        }

        let mut state = Self::from_cells(document.width, document.height, cells)?;
        state.water_window = window;
        state.day = document.day;

        let mut live = 0;
        for entity in document.entities {
            let coord = CellCoord::new(entity.x, entity.y);
            let index = state
                .index(coord)
                .map_err(|_| StateError::EntityOutOfBounds {
                    id: entity.id,
                    x: entity.x,
                    y: entity.y,
                })?;
            let id = EntityId::new(entity.id);
            if state.entities.contains_key(&id) {
                return Err(StateError::DuplicateEntity(entity.id));
            }
            live = live.max(entity.id);
            state.cells[index].add_occupant(id);
            let _ = state.entities.insert(
                id,
                Entity {
                    id,
                    species: entity.species,
                    cell: coord,
                    hunger: entity.hunger,
                    age: entity.age,
                },
            );
        }

        if !state.entities.is_empty() && document.next_entity_id <= live {
            return Err(StateError::StaleAllocator {
                next: document.next_entity_id,
                live,
            });
        }
        state.next_entity_id = document.next_entity_id.max(1);
        Ok(state)
    }
}

fn default_window() -> usize {
    patient_world_core::DEFAULT_WATER_HISTORY_WINDOW
}

fn encode_cell(cell: &Cell) -> CellDocument {
    let limiting = cell.limiting_factor();
    CellDocument {
        producers: cell
            .producers()
            .map(|(guild, amount)| (guild.key().to_owned(), amount))
            .collect(),
        water: cell.water(),
        fertility: cell.fertility(),
        temperature: cell.temperature(),
        water_history: cell.water_history().collect(),
        limiting_factor: limiting.map(|limiting| limiting.factor),
        limiting_value: limiting.map(|limiting| limiting.value),
    }
}

fn decode_cell(index: usize, document: CellDocument, window: usize) -> Result<Cell, StateError> {
    let mut biomass = [0; GUILD_COUNT];
    for (key, amount) in document.producers {
        let guild = Guild::from_key(&key).ok_or(StateError::UnknownGuild { index, key })?;
        biomass[guild.index()] = amount;
    }

    let water = unit_field(index, "water", document.water)?;
    let fertility = unit_field(index, "fertility", document.fertility)?;
    let temperature = unit_field(index, "temperature", document.temperature)?;
    if document.water_history.is_empty() {
        return Err(StateError::EmptyWaterHistory { index });
    }
    if document.water_history.len() > window {
        return Err(StateError::WaterHistoryTooLong {
            index,
            len: document.water_history.len(),
            window,
        });
    }
    let history = document
        .water_history
        .into_iter()
        .map(|sample| unit_field(index, "water_history", sample))
        .collect::<Result<VecDeque<f64>, StateError>>()?;

    let limiting = match (document.limiting_factor, document.limiting_value) {
        (Some(factor), value) => Some(LimitingFactor {
            factor,
            value: unit_field(index, "limiting_value", value.unwrap_or(1.0))?,
        }),
        (None, _) => None,
    };

    Ok(Cell::restore(
        biomass,
        water,
        fertility,
        temperature,
        history,
        limiting,
    ))
}

fn unit_field(index: usize, field: &'static str, value: f64) -> Result<f64, StateError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(StateError::FieldOutOfRange {
            index,
            field,
            value,
        })
    }
}
