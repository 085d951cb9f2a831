//! Capture target: an arena render graph
//!
//! The card is an addressable scene of [`NodeId`]-indexed nodes. Swapping the
//! live video for a still frame is an explicit tree edit that returns an undo
//! record; restoring consumes the record, so a swap cannot be restored twice
//! or forgotten silently.
//!
//! ```text
//! root ─┬─ header (Text)
//!       ├─ badge  (Container) ─── video (Video)      <- live media
//!       └─ rows   (Container) ─┬─ ...
//!
//! replace_with_substitute(video):
//!       ├─ badge  (Container) ─── still (Substitute) <- frame of video
//!                                 video: detached, kept in arena
//! ```

use crate::media::MediaSource;
use crate::result::{ExportError, ExportResult};
use image::RgbaImage;
use std::fmt;
use std::sync::Arc;

/// Index of a node in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw arena index
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Layout box in CSS pixels, relative to the target's origin
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Rect {
    /// Create a rect
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Computed style, reduced to what the rasterizer paints
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    /// Fill behind the node
    pub background: Option<[u8; 4]>,
    /// Text color
    pub color: [u8; 4],
    /// Clip the node to the ellipse inscribed in its rect
    pub circular: bool,
    /// Glyph cell height in CSS pixels
    pub font_size: f32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            background: None,
            color: [255, 255, 255, 255],
            circular: false,
            font_size: 14.0,
        }
    }
}

impl Style {
    /// Set the background fill
    #[must_use]
    pub const fn with_background(mut self, rgba: [u8; 4]) -> Self {
        self.background = Some(rgba);
        self
    }

    /// Set the text color
    #[must_use]
    pub const fn with_color(mut self, rgba: [u8; 4]) -> Self {
        self.color = rgba;
        self
    }

    /// Clip to a circle
    #[must_use]
    pub const fn circular(mut self) -> Self {
        self.circular = true;
        self
    }

    /// Set the font size
    #[must_use]
    pub const fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }
}

/// What a node draws
pub enum NodeKind {
    /// Box that only paints its background and children
    Container,
    /// Single-line text run
    Text(String),
    /// Live media; the rasterizer cannot read it
    Video(Box<dyn MediaSource>),
    /// Still frame standing in for a detached video
    Substitute(Arc<RgbaImage>),
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container => f.write_str("Container"),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Video(media) => f.debug_tuple("Video").field(media).finish(),
            Self::Substitute(img) => write!(f, "Substitute({}x{})", img.width(), img.height()),
        }
    }
}

/// A node in the scene
#[derive(Debug)]
pub struct Node {
    /// Content
    pub kind: NodeKind,
    /// Layout box
    pub rect: Rect,
    /// Computed style
    pub style: Style,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    /// Parent, if attached
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in paint order
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A node removed from its parent, remembering where it was
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a detached node must be reattached"]
pub struct DetachedNode {
    /// The detached node (still in the arena)
    pub node: NodeId,
    /// Original parent
    pub parent: NodeId,
    /// Original child index
    pub index: usize,
}

/// Undo record for [`CaptureTarget::replace_with_substitute`]
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a swap must be restored"]
pub struct SwapRecord {
    /// Where the original node came from
    pub detached: DetachedNode,
    /// The substitute occupying its slot
    pub substitute: NodeId,
}

/// The renderable card subtree
#[derive(Debug)]
pub struct CaptureTarget {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    root: NodeId,
}

impl CaptureTarget {
    /// Create a target whose root container covers `width` x `height`
    #[must_use]
    pub fn new(width: f32, height: f32, style: Style) -> Self {
        let root = Node {
            kind: NodeKind::Container,
            rect: Rect::new(0.0, 0.0, width, height),
            style,
            parent: None,
            children: Vec::new(),
        };
        Self {
            slots: vec![Some(root)],
            free: Vec::new(),
            root: NodeId(0),
        }
    }

    /// Root node
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Size of the root box in CSS pixels
    #[must_use]
    pub fn size(&self) -> (f32, f32) {
        self.node(self.root)
            .map_or((0.0, 0.0), |n| (n.rect.width, n.rect.height))
    }

    /// Look up a node
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> ExportResult<&mut Node> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| ExportError::invalid_target(format!("node {} does not exist", id.0)))
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            self.slots[index] = Some(node);
            NodeId(index)
        } else {
            self.slots.push(Some(node));
            NodeId(self.slots.len() - 1)
        }
    }

    /// Append a child to `parent`
    pub fn append(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        rect: Rect,
        style: Style,
    ) -> ExportResult<NodeId> {
        let len = self.node_mut(parent)?.children.len();
        self.insert_at(parent, len, kind, rect, style)
    }

    fn insert_at(
        &mut self,
        parent: NodeId,
        index: usize,
        kind: NodeKind,
        rect: Rect,
        style: Style,
    ) -> ExportResult<NodeId> {
        let len = self.node_mut(parent)?.children.len();
        if index > len {
            return Err(ExportError::invalid_target(format!(
                "index {index} out of bounds for {len} children"
            )));
        }
        let id = self.alloc(Node {
            kind,
            rect,
            style,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.node_mut(parent)?.children.insert(index, id);
        Ok(id)
    }

    /// Parent and child index of an attached node
    #[must_use]
    pub fn position(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.node(id)?.parent?;
        let index = self.node(parent)?.children.iter().position(|&c| c == id)?;
        Some((parent, index))
    }

    /// Attached nodes in paint order (pre-order from the root)
    #[must_use]
    pub fn paint_order(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.node(id) {
                order.push(id);
                stack.extend(node.children.iter().rev());
            }
        }
        order
    }

    /// First attached video node
    #[must_use]
    pub fn find_media(&self) -> Option<NodeId> {
        self.paint_order()
            .into_iter()
            .find(|&id| matches!(self.node(id).map(|n| &n.kind), Some(NodeKind::Video(_))))
    }

    /// Number of substitutes currently attached
    #[must_use]
    pub fn substitute_count(&self) -> usize {
        self.paint_order()
            .into_iter()
            .filter(|&id| {
                matches!(
                    self.node(id).map(|n| &n.kind),
                    Some(NodeKind::Substitute(_))
                )
            })
            .count()
    }

    /// Borrow the media of a video node, attached or detached
    pub fn media(&self, id: NodeId) -> ExportResult<&dyn MediaSource> {
        match self.node(id).map(|n| &n.kind) {
            Some(NodeKind::Video(media)) => Ok(media.as_ref()),
            _ => Err(ExportError::invalid_target(format!(
                "node {} is not a video",
                id.0
            ))),
        }
    }

    /// Mutably borrow the media of a video node, attached or detached
    pub fn media_mut(&mut self, id: NodeId) -> ExportResult<&mut dyn MediaSource> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Video(media) => Ok(media.as_mut()),
            _ => Err(ExportError::invalid_target(format!(
                "node {} is not a video",
                id.0
            ))),
        }
    }

    /// Remove a node from its parent, keeping it in the arena
    pub fn detach(&mut self, id: NodeId) -> ExportResult<DetachedNode> {
        let (parent, index) = self
            .position(id)
            .ok_or_else(|| ExportError::invalid_target(format!("node {} is not attached", id.0)))?;
        self.node_mut(parent)?.children.remove(index);
        self.node_mut(id)?.parent = None;
        Ok(DetachedNode {
            node: id,
            parent,
            index,
        })
    }

    /// Put a detached node back at its original slot
    pub fn reattach(&mut self, detached: DetachedNode) -> ExportResult<()> {
        let DetachedNode {
            node,
            parent,
            index,
        } = detached;
        let siblings = &mut self.node_mut(parent)?.children;
        let index = index.min(siblings.len());
        siblings.insert(index, node);
        self.node_mut(node)?.parent = Some(parent);
        Ok(())
    }

    /// Insert a still frame into the slot a detached node left, filling its
    /// footprint
    pub fn insert_substitute(
        &mut self,
        slot: &DetachedNode,
        frame: Arc<RgbaImage>,
    ) -> ExportResult<NodeId> {
        let (rect, style) = {
            let original = self.node(slot.node).ok_or_else(|| {
                ExportError::invalid_target(format!("node {} does not exist", slot.node.0))
            })?;
            (original.rect, original.style)
        };
        self.insert_at(
            slot.parent,
            slot.index,
            NodeKind::Substitute(frame),
            rect,
            style,
        )
    }

    /// Remove an attached leaf node and free its slot
    pub fn remove(&mut self, id: NodeId) -> ExportResult<()> {
        if id == self.root {
            return Err(ExportError::invalid_target("cannot remove the root"));
        }
        if !self.node(id).is_some_and(|n| n.children.is_empty()) {
            return Err(ExportError::invalid_target(format!(
                "node {} is missing or has children",
                id.0
            )));
        }
        if self.position(id).is_some() {
            let _slot = self.detach(id)?;
        }
        self.slots[id.0] = None;
        self.free.push(id.0);
        Ok(())
    }

    /// Detach `id` and put a still frame in its place
    pub fn replace_with_substitute(
        &mut self,
        id: NodeId,
        frame: Arc<RgbaImage>,
    ) -> ExportResult<SwapRecord> {
        let detached = self.detach(id)?;
        match self.insert_substitute(&detached, frame) {
            Ok(substitute) => Ok(SwapRecord {
                detached,
                substitute,
            }),
            Err(e) => {
                self.reattach(detached)?;
                Err(e)
            }
        }
    }

    /// Undo a swap. The original node is reattached even when removing the
    /// substitute fails; the first error is returned.
    pub fn restore(&mut self, record: SwapRecord) -> ExportResult<()> {
        let removed = self.remove(record.substitute);
        let reattached = self.reattach(record.detached);
        removed.and(reattached)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clip::ClipMedia;

    fn target_with_video() -> (CaptureTarget, NodeId, NodeId) {
        let mut target = CaptureTarget::new(100.0, 100.0, Style::default());
        let root = target.root();
        target
            .append(root, NodeKind::Text("title".into()), Rect::default(), Style::default())
            .unwrap();
        let badge = target
            .append(root, NodeKind::Container, Rect::new(10.0, 10.0, 40.0, 40.0), Style::default())
            .unwrap();
        target
            .append(badge, NodeKind::Text("before".into()), Rect::default(), Style::default())
            .unwrap();
        let media = ClipMedia::color_cycle(8, 8, &[[255, 0, 0, 255]], 1.0);
        let video = target
            .append(
                badge,
                NodeKind::Video(Box::new(media)),
                Rect::new(10.0, 10.0, 40.0, 40.0),
                Style::default().circular(),
            )
            .unwrap();
        target
            .append(badge, NodeKind::Text("after".into()), Rect::default(), Style::default())
            .unwrap();
        (target, badge, video)
    }

    mod arena_tests {
        use super::*;

        #[test]
        fn test_find_media() {
            let (target, _, video) = target_with_video();
            assert_eq!(target.find_media(), Some(video));
        }

        #[test]
        fn test_no_media() {
            let target = CaptureTarget::new(10.0, 10.0, Style::default());
            assert!(target.find_media().is_none());
        }

        #[test]
        fn test_paint_order_is_preorder() {
            let (target, badge, video) = target_with_video();
            let order = target.paint_order();
            let badge_pos = order.iter().position(|&n| n == badge).unwrap();
            let video_pos = order.iter().position(|&n| n == video).unwrap();
            assert_eq!(order[0], target.root());
            assert!(badge_pos < video_pos);
        }

        #[test]
        fn test_media_accessors_reject_non_video() {
            let (mut target, badge, _) = target_with_video();
            assert!(target.media(badge).is_err());
            assert!(target.media_mut(badge).is_err());
        }

        #[test]
        fn test_remove_root_fails() {
            let (mut target, _, _) = target_with_video();
            let root = target.root();
            assert!(target.remove(root).is_err());
        }

        #[test]
        fn test_freed_slot_is_reused() {
            let (mut target, badge, _) = target_with_video();
            let temp = target
                .append(badge, NodeKind::Container, Rect::default(), Style::default())
                .unwrap();
            target.remove(temp).unwrap();
            let again = target
                .append(badge, NodeKind::Container, Rect::default(), Style::default())
                .unwrap();
            assert_eq!(temp, again);
        }
    }

    mod swap_tests {
        use super::*;

        fn still() -> Arc<RgbaImage> {
            Arc::new(RgbaImage::new(4, 4))
        }

        #[test]
        fn test_replace_keeps_slot_and_footprint() {
            let (mut target, badge, video) = target_with_video();
            let record = target.replace_with_substitute(video, still()).unwrap();

            assert_eq!(target.position(record.substitute), Some((badge, 1)));
            assert!(target.position(video).is_none());
            assert!(target.find_media().is_none());
            let sub = target.node(record.substitute).unwrap();
            assert_eq!(sub.rect, Rect::new(10.0, 10.0, 40.0, 40.0));
            assert!(sub.style.circular);

            target.restore(record).unwrap();
            assert_eq!(target.position(video), Some((badge, 1)));
            assert_eq!(target.substitute_count(), 0);
        }

        #[test]
        fn test_media_reachable_while_detached() {
            let (mut target, _, video) = target_with_video();
            let detached = target.detach(video).unwrap();
            target.media_mut(video).unwrap().set_current_time(0.25);
            assert_eq!(target.media(video).unwrap().current_time(), 0.25);
            target.reattach(detached).unwrap();
        }

        #[test]
        fn test_repeated_substitutes_in_one_slot() {
            let (mut target, badge, video) = target_with_video();
            let slot = target.detach(video).unwrap();
            for _ in 0..5 {
                let sub = target.insert_substitute(&slot, still()).unwrap();
                assert_eq!(target.position(sub), Some((badge, 1)));
                target.remove(sub).unwrap();
            }
            target.reattach(slot).unwrap();
            assert_eq!(target.position(video), Some((badge, 1)));
            assert_eq!(target.node(badge).unwrap().children().len(), 3);
        }

        #[test]
        fn test_restore_reattaches_even_if_substitute_gone() {
            let (mut target, badge, video) = target_with_video();
            let record = target.replace_with_substitute(video, still()).unwrap();
            target.remove(record.substitute).unwrap();

            assert!(target.restore(record).is_err());
            assert_eq!(target.position(video), Some((badge, 1)));
        }

        #[test]
        fn test_detach_unattached_fails() {
            let (mut target, _, video) = target_with_video();
            let detached = target.detach(video).unwrap();
            assert!(target.detach(video).is_err());
            target.reattach(detached).unwrap();
        }
    }
}
