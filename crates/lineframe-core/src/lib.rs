//! Lineframe Core Library
//!
//! Platform-agnostic document model and interaction logic for the Lineframe
//! structural drafting tool: members on a node graph, planar surfaces,
//! loads and supports across levels, resolved against a section catalog.

pub mod camera;
pub mod catalog;
pub mod color;
pub mod config;
pub mod document;
pub mod elements;
pub mod error;
pub mod format;
pub mod geometry;
pub mod history;
pub mod input;
pub mod session;
pub mod snap;
pub mod storage;
pub mod tools;

pub use camera::Camera;
pub use catalog::{Catalog, NewSection, SectionDefinition, SectionKind, SectionPatch, SpringDefinition};
pub use color::Color;
pub use config::{InteractionConfig, Settings};
pub use document::{Document, Snapshot};
pub use elements::{ElementRef, Level, Load, LoadKind, LoadType, Member, MemberKind, Node, Support, Surface, SurfaceGeometry, SurfaceKind};
pub use error::{FormatError, FormatResult, ValidationError};
pub use format::SCHEMA_VERSION;
pub use history::History;
pub use input::{InputState, KEY_BINDINGS, KeyAction, KeyBinding, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use session::{DraftDefaults, Session};
pub use snap::{SnapResult, SnapTarget, snap_position, snap_to_grid};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use tools::{Placement, Preview, ToolKind, ToolManager};
