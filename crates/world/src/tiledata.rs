use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};

/// Per-graphic flags of baked-in fixtures and multi components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticTileData {
    pub name: String,
    pub height: u8,
    pub is_background: bool,
    pub is_multi_movable: bool,
    pub is_roof: bool,
    pub is_wet: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LandTileData {
    pub name: String,
    /// Zero means the land tile has no stretchable texture.
    pub texture_id: u16,
}

pub trait TileCatalog {
    fn static_tile(&self, graphic: u16) -> Option<&StaticTileData>;

    fn land_tile(&self, graphic: u16) -> Option<&LandTileData>;
}

#[derive(Debug, Clone, Default)]
pub struct TileDataCatalog {
    statics: HashMap<u16, StaticTileData>,
    lands: HashMap<u16, LandTileData>,
}

impl TileDataCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_static(&mut self, graphic: u16, data: StaticTileData) {
        self.statics.insert(graphic, data);
    }

    pub fn insert_land(&mut self, graphic: u16, data: LandTileData) {
        self.lands.insert(graphic, data);
    }

    pub fn static_count(&self) -> usize {
        self.statics.len()
    }

    pub fn land_count(&self) -> usize {
        self.lands.len()
    }
}

impl TileCatalog for TileDataCatalog {
    fn static_tile(&self, graphic: u16) -> Option<&StaticTileData> {
        self.statics.get(&graphic)
    }

    fn land_tile(&self, graphic: u16) -> Option<&LandTileData> {
        self.lands.get(&graphic)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileCatalogErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownElement,
    UnknownAttribute,
    MissingAttribute,
    InvalidValue,
    DuplicateId,
}

#[derive(Debug, Clone)]
pub struct TileCatalogError {
    pub code: TileCatalogErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for TileCatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for TileCatalogError {}

pub fn load_tile_catalog(path: &Path) -> Result<TileDataCatalog, TileCatalogError> {
    let raw = fs::read_to_string(path).map_err(|source| TileCatalogError {
        code: TileCatalogErrorCode::ReadFile,
        message: format!("failed to read tile data: {source}"),
        file_path: path.to_path_buf(),
        location: None,
    })?;
    parse_tile_catalog(path, &raw)
}

/// Parses `<TileData>` containing `<Land>` and `<Static>` elements. Ids and
/// numeric attributes accept decimal or `0x` hex.
pub fn parse_tile_catalog(
    file_path: &Path,
    raw: &str,
) -> Result<TileDataCatalog, TileCatalogError> {
    let doc = Document::parse(raw).map_err(|error| TileCatalogError {
        code: TileCatalogErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "TileData" {
        return Err(error_at_node(
            TileCatalogErrorCode::InvalidRoot,
            "root element must be <TileData>".to_string(),
            file_path,
            &doc,
            root,
        ));
    }

    let mut catalog = TileDataCatalog::new();
    let mut seen_lands = HashSet::<u16>::new();
    let mut seen_statics = HashSet::<u16>::new();
    let ctx = ParseContext {
        file_path,
        doc: &doc,
    };

    for node in root.children().filter(|node| node.is_element()) {
        match node.tag_name().name() {
            "Land" => {
                let (id, data) = parse_land(&ctx, node)?;
                if !seen_lands.insert(id) {
                    return Err(ctx.error(
                        TileCatalogErrorCode::DuplicateId,
                        format!("duplicate <Land> id 0x{id:04X}"),
                        node,
                    ));
                }
                catalog.insert_land(id, data);
            }
            "Static" => {
                let (id, data) = parse_static(&ctx, node)?;
                if !seen_statics.insert(id) {
                    return Err(ctx.error(
                        TileCatalogErrorCode::DuplicateId,
                        format!("duplicate <Static> id 0x{id:04X}"),
                        node,
                    ));
                }
                catalog.insert_static(id, data);
            }
            other => {
                return Err(ctx.error(
                    TileCatalogErrorCode::UnknownElement,
                    format!("unsupported element <{other}>; expected <Land> or <Static>"),
                    node,
                ))
            }
        }
    }

    Ok(catalog)
}

struct ParseContext<'a, 'input> {
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl ParseContext<'_, '_> {
    fn error(
        &self,
        code: TileCatalogErrorCode,
        message: String,
        node: Node<'_, '_>,
    ) -> TileCatalogError {
        error_at_node(code, message, self.file_path, self.doc, node)
    }

    fn check_attributes(
        &self,
        node: Node<'_, '_>,
        allowed: &[&str],
    ) -> Result<(), TileCatalogError> {
        for attribute in node.attributes() {
            if !allowed.contains(&attribute.name()) {
                return Err(self.error(
                    TileCatalogErrorCode::UnknownAttribute,
                    format!(
                        "unknown attribute '{}' on <{}>",
                        attribute.name(),
                        node.tag_name().name()
                    ),
                    node,
                ));
            }
        }
        Ok(())
    }

    fn required_u16(&self, node: Node<'_, '_>, name: &str) -> Result<u16, TileCatalogError> {
        let Some(raw) = node.attribute(name) else {
            return Err(self.error(
                TileCatalogErrorCode::MissingAttribute,
                format!(
                    "missing required attribute '{}' on <{}>",
                    name,
                    node.tag_name().name()
                ),
                node,
            ));
        };
        parse_number(raw).ok_or_else(|| {
            self.error(
                TileCatalogErrorCode::InvalidValue,
                format!("attribute '{name}' value '{raw}' is not a valid u16"),
                node,
            )
        })
    }

    fn optional_u16(&self, node: Node<'_, '_>, name: &str) -> Result<u16, TileCatalogError> {
        if node.attribute(name).is_none() {
            return Ok(0);
        }
        self.required_u16(node, name)
    }

    fn optional_bool(&self, node: Node<'_, '_>, name: &str) -> Result<bool, TileCatalogError> {
        match node.attribute(name) {
            None => Ok(false),
            Some("true") | Some("1") => Ok(true),
            Some("false") | Some("0") => Ok(false),
            Some(raw) => Err(self.error(
                TileCatalogErrorCode::InvalidValue,
                format!("attribute '{name}' value '{raw}' must be true or false"),
                node,
            )),
        }
    }
}

fn parse_land(
    ctx: &ParseContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<(u16, LandTileData), TileCatalogError> {
    ctx.check_attributes(node, &["id", "name", "texture"])?;
    let id = ctx.required_u16(node, "id")?;
    let texture_id = ctx.optional_u16(node, "texture")?;
    Ok((
        id,
        LandTileData {
            name: node.attribute("name").unwrap_or_default().to_string(),
            texture_id,
        },
    ))
}

fn parse_static(
    ctx: &ParseContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<(u16, StaticTileData), TileCatalogError> {
    ctx.check_attributes(
        node,
        &[
            "id",
            "name",
            "height",
            "background",
            "multiMovable",
            "roof",
            "wet",
        ],
    )?;
    let id = ctx.required_u16(node, "id")?;
    let height = ctx.optional_u16(node, "height")?;
    let height = u8::try_from(height).map_err(|_| {
        ctx.error(
            TileCatalogErrorCode::InvalidValue,
            format!("height {height} exceeds 255"),
            node,
        )
    })?;
    Ok((
        id,
        StaticTileData {
            name: node.attribute("name").unwrap_or_default().to_string(),
            height,
            is_background: ctx.optional_bool(node, "background")?,
            is_multi_movable: ctx.optional_bool(node, "multiMovable")?,
            is_roof: ctx.optional_bool(node, "roof")?,
            is_wet: ctx.optional_bool(node, "wet")?,
        },
    ))
}

fn parse_number(raw: &str) -> Option<u16> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => raw.parse::<u16>().ok(),
    }
}

fn error_at_node(
    code: TileCatalogErrorCode,
    message: String,
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> TileCatalogError {
    let pos = doc.text_pos_at(node.range().start);
    TileCatalogError {
        code,
        message,
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: pos.row as usize,
            column: pos.col as usize,
        }),
    }
}
