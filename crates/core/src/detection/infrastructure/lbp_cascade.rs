//! Boosted LBP cascade in the OpenCV `opencv-cascade-classifier` XML format,
//! e.g. `lbpcascade_animeface.xml`.
//!
//! Only the pieces needed for evaluation are kept: the detection window,
//! the feature rectangles, and per-stage thresholds with their weak
//! classifier trees.

use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use thiserror::Error;

/// LBP codes are 8-bit, so each split carries a 256-bit category subset.
const SUBSET_WORDS: usize = 8;

/// `left right feature_index subset[8]`
const NODE_FIELDS: usize = 3 + SUBSET_WORDS;

/// Taken off every stage threshold at load, as OpenCV does, so scores that
/// land on the threshold within float noise still pass.
pub const STAGE_THRESHOLD_EPS: f32 = 1e-5;

#[derive(Error, Debug)]
pub enum CascadeError {
    #[error("failed to read cascade {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid cascade XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("cascade is missing <{0}>")]
    MissingElement(&'static str),
    #[error("invalid number {value:?} in <{element}>")]
    BadNumber { element: &'static str, value: String },
    #[error("unsupported cascade feature type {0:?} (only LBP cascades are supported)")]
    UnsupportedFeatureType(String),
    #[error("malformed cascade: {0}")]
    Malformed(String),
}

/// A 3×3 grid of equal `width × height` blocks anchored at `(x, y)` inside
/// the detection window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LbpFeature {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
    /// Next node index when the code is in `subset`; `<= 0` means leaf `-left`.
    pub left: i32,
    pub right: i32,
    pub feature: usize,
    pub subset: [u32; SUBSET_WORDS],
}

impl TreeNode {
    pub fn contains(&self, code: u8) -> bool {
        self.subset[(code >> 5) as usize] & (1u32 << (code & 31)) != 0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WeakClassifier {
    pub nodes: Vec<TreeNode>,
    pub leaves: Vec<f32>,
}

impl WeakClassifier {
    /// Walks the tree from its root and returns the reached leaf value.
    pub fn evaluate(&self, code_of: impl Fn(usize) -> u8) -> f32 {
        let mut idx: i32 = 0;
        loop {
            let node = &self.nodes[idx as usize];
            idx = if node.contains(code_of(node.feature)) {
                node.left
            } else {
                node.right
            };
            if idx <= 0 {
                return self.leaves[(-idx) as usize];
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    pub threshold: f32,
    pub classifiers: Vec<WeakClassifier>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LbpCascade {
    window_width: u32,
    window_height: u32,
    stages: Vec<Stage>,
    features: Vec<LbpFeature>,
}

impl LbpCascade {
    pub fn from_file(path: &Path) -> Result<Self, CascadeError> {
        let text = fs::read_to_string(path).map_err(|e| CascadeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let cascade = Self::from_xml_str(&text)?;
        log::info!(
            "Loaded cascade {} ({} stages, {}x{} window)",
            path.display(),
            cascade.stages.len(),
            cascade.window_width,
            cascade.window_height
        );
        Ok(cascade)
    }

    pub fn from_xml_str(xml: &str) -> Result<Self, CascadeError> {
        let doc = Document::parse(xml)?;
        let root = doc
            .descendants()
            .find(|n| n.has_tag_name("cascade"))
            .ok_or(CascadeError::MissingElement("cascade"))?;

        let feature_type = child_text(root, "featureType")?;
        if !feature_type.eq_ignore_ascii_case("LBP") {
            return Err(CascadeError::UnsupportedFeatureType(feature_type.to_string()));
        }

        let window_width: u32 = parse_one(root, "width")?;
        let window_height: u32 = parse_one(root, "height")?;

        let features = child(root, "features")?
            .children()
            .filter(Node::is_element)
            .map(parse_feature)
            .collect::<Result<Vec<_>, _>>()?;

        let stages = child(root, "stages")?
            .children()
            .filter(Node::is_element)
            .map(parse_stage)
            .collect::<Result<Vec<_>, _>>()?;

        let cascade = Self {
            window_width,
            window_height,
            stages,
            features,
        };
        cascade.validate()?;
        Ok(cascade)
    }

    pub fn window_width(&self) -> u32 {
        self.window_width
    }

    pub fn window_height(&self) -> u32 {
        self.window_height
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn features(&self) -> &[LbpFeature] {
        &self.features
    }

    /// Rejects structures that would index out of bounds during evaluation.
    fn validate(&self) -> Result<(), CascadeError> {
        if self.window_width == 0 || self.window_height == 0 {
            return Err(CascadeError::Malformed("zero-sized window".into()));
        }
        if self.stages.is_empty() {
            return Err(CascadeError::Malformed("no stages".into()));
        }

        for (i, f) in self.features.iter().enumerate() {
            if f.width == 0
                || f.height == 0
                || f.x + 3 * f.width > self.window_width
                || f.y + 3 * f.height > self.window_height
            {
                return Err(CascadeError::Malformed(format!(
                    "feature {i} does not fit the {}x{} window",
                    self.window_width, self.window_height
                )));
            }
        }

        for (si, stage) in self.stages.iter().enumerate() {
            for classifier in &stage.classifiers {
                if classifier.nodes.is_empty() {
                    return Err(CascadeError::Malformed(format!("stage {si}: empty tree")));
                }
                for (ni, node) in classifier.nodes.iter().enumerate() {
                    if node.feature >= self.features.len() {
                        return Err(CascadeError::Malformed(format!(
                            "stage {si}: feature index {} out of range",
                            node.feature
                        )));
                    }
                    for next in [node.left, node.right] {
                        // Branches only point forward, so evaluation always terminates.
                        let in_range = if next > 0 {
                            (next as usize) > ni && (next as usize) < classifier.nodes.len()
                        } else {
                            ((-next) as usize) < classifier.leaves.len()
                        };
                        if !in_range {
                            return Err(CascadeError::Malformed(format!(
                                "stage {si}: branch target {next} out of range"
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn parse_feature(node: Node) -> Result<LbpFeature, CascadeError> {
    let values: Vec<u32> = parse_list(child(node, "rect")?, "rect")?;
    match values.as_slice() {
        [x, y, width, height] => Ok(LbpFeature {
            x: *x,
            y: *y,
            width: *width,
            height: *height,
        }),
        _ => Err(CascadeError::Malformed(format!(
            "feature rect needs 4 values, got {}",
            values.len()
        ))),
    }
}

fn parse_stage(node: Node) -> Result<Stage, CascadeError> {
    let threshold = parse_one::<f32>(node, "stageThreshold")? - STAGE_THRESHOLD_EPS;
    let classifiers = child(node, "weakClassifiers")?
        .children()
        .filter(Node::is_element)
        .map(parse_weak_classifier)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Stage {
        threshold,
        classifiers,
    })
}

fn parse_weak_classifier(node: Node) -> Result<WeakClassifier, CascadeError> {
    let raw: Vec<i64> = parse_list(child(node, "internalNodes")?, "internalNodes")?;
    if raw.is_empty() || raw.len() % NODE_FIELDS != 0 {
        return Err(CascadeError::Malformed(format!(
            "internalNodes length {} is not a multiple of {NODE_FIELDS}",
            raw.len()
        )));
    }

    let nodes = raw
        .chunks_exact(NODE_FIELDS)
        .map(|c| {
            if c[2] < 0 {
                return Err(CascadeError::Malformed(format!(
                    "negative feature index {}",
                    c[2]
                )));
            }
            let mut subset = [0u32; SUBSET_WORDS];
            for (word, value) in subset.iter_mut().zip(&c[3..]) {
                // Subset words are written as signed 32-bit integers.
                *word = *value as i32 as u32;
            }
            Ok(TreeNode {
                left: c[0] as i32,
                right: c[1] as i32,
                feature: c[2] as usize,
                subset,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let leaves: Vec<f32> = parse_list(child(node, "leafValues")?, "leafValues")?;
    Ok(WeakClassifier { nodes, leaves })
}

fn child<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> Result<Node<'a, 'input>, CascadeError> {
    node.children()
        .find(|n| n.has_tag_name(name))
        .ok_or(CascadeError::MissingElement(name))
}

fn child_text<'a>(node: Node<'a, '_>, name: &'static str) -> Result<&'a str, CascadeError> {
    Ok(child(node, name)?.text().unwrap_or("").trim())
}

fn parse_one<T: std::str::FromStr>(node: Node, name: &'static str) -> Result<T, CascadeError> {
    let text = child_text(node, name)?;
    text.parse().map_err(|_| CascadeError::BadNumber {
        element: name,
        value: text.to_string(),
    })
}

fn parse_list<T: std::str::FromStr>(node: Node, name: &'static str) -> Result<Vec<T>, CascadeError> {
    node.text()
        .unwrap_or("")
        .split_whitespace()
        .map(|token| {
            token.parse().map_err(|_| CascadeError::BadNumber {
                element: name,
                value: token.to_string(),
            })
        })
        .collect()
}
