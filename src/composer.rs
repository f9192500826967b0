use glam::Vec2;

use crate::{
    config::Config,
    detect::detect,
    document::{BlockAnchor, FontDescriptor, TextAlign, TextBlock},
    error::Result,
    font::MeasureText,
    geometry::{Padding, Rect},
    restore::{restore, snapshot, ImageResolver, Placement},
    schedule::{Clock, Debouncer},
    spot::{Spot, SpotContent, WaitingQueue},
    text_layout::{LayoutCache, LayoutResult},
};

/// Why a detection pass was scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Edit,
    Immediate,
}

/// Owns a text block and the spots around it, and keeps the spots in step
/// with the text.
///
/// Edits schedule a detection pass on a single-slot timer; call
/// [`Composer::tick`] from the event loop to run it once it is due. A pass
/// lays the text out, detects spots, and moves the content of the previous
/// spots (and of anything still waiting) onto the new ones.
pub struct Composer<M, R, C> {
    config: Config,
    canvas_size: Vec2,
    block: TextBlock,
    measurer: M,
    resolver: R,
    cache: LayoutCache,
    spots: Vec<Spot>,
    waiting: WaitingQueue,
    debouncer: Debouncer<C, Trigger>,
}

impl<M, R, C> Composer<M, R, C>
where
    M: MeasureText,
    R: ImageResolver,
    C: Clock,
{
    pub fn new(
        canvas_size: Vec2,
        block: TextBlock,
        measurer: M,
        resolver: R,
        clock: C,
        config: Config,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            canvas_size,
            block,
            measurer,
            resolver,
            cache: LayoutCache::default(),
            spots: Vec::new(),
            waiting: WaitingQueue::new(),
            debouncer: Debouncer::new(clock),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn block(&self) -> &TextBlock {
        &self.block
    }

    pub fn canvas_size(&self) -> Vec2 {
        self.canvas_size
    }

    pub fn spots(&self) -> &[Spot] {
        &self.spots
    }

    pub fn waiting(&self) -> &WaitingQueue {
        &self.waiting
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// The current layout, recomputed only if the block changed since the
    /// last call.
    pub fn layout(&mut self) -> &LayoutResult {
        self.cache
            .layout(&self.block, &self.measurer, &self.config.auto_fit)
    }

    pub fn set_config(&mut self, config: Config) -> Result<()> {
        config.validate()?;
        if config.auto_fit != self.config.auto_fit {
            self.cache.invalidate();
        }
        self.config = config;
        Ok(())
    }

    pub fn set_canvas_size(&mut self, canvas_size: Vec2) {
        self.canvas_size = canvas_size;
        self.schedule(Trigger::Edit);
    }

    pub fn set_text(&mut self, content: impl Into<String>) {
        self.block.set_content(content);
        self.schedule(Trigger::Edit);
    }

    pub fn set_font(&mut self, font: FontDescriptor) {
        self.block.set_font(font);
        self.schedule(Trigger::Edit);
    }

    pub fn set_container(&mut self, container: Rect) {
        self.block.set_container(container);
        self.schedule(Trigger::Edit);
    }

    pub fn set_padding(&mut self, padding: Padding) {
        self.block.set_padding(padding);
        self.schedule(Trigger::Edit);
    }

    pub fn set_anchor(&mut self, anchor: BlockAnchor) {
        self.block.set_block_anchor(anchor);
        self.schedule(Trigger::Edit);
    }

    pub fn set_wrap(&mut self, wrap_enabled: bool) {
        self.block.set_wrap_enabled(wrap_enabled);
        self.schedule(Trigger::Edit);
    }

    pub fn set_line_spacing(&mut self, line_spacing: f32) {
        self.block.set_line_spacing(line_spacing);
        self.schedule(Trigger::Edit);
    }

    pub fn set_line_alignment(&mut self, line_text: &str, align: Option<TextAlign>) {
        self.block.set_line_alignment(line_text, align);
        self.schedule(Trigger::Edit);
    }

    /// Turning auto-detect on runs a pass after the short delay; turning it
    /// off drops any pass still pending.
    pub fn set_auto_detect(&mut self, enabled: bool) {
        self.config.auto_detect = enabled;
        if enabled {
            self.schedule(Trigger::Immediate);
        } else {
            self.debouncer.cancel();
        }
    }

    /// Replaces the content of a live spot. Returns `false` if no spot has
    /// that id.
    pub fn set_spot_content(&mut self, id: u32, content: SpotContent) -> bool {
        match self.spots.iter_mut().find(|spot| spot.id == id) {
            Some(spot) => {
                spot.content = content;
                true
            }
            None => false,
        }
    }

    /// Runs the scheduled pass if it is due.
    pub fn tick(&mut self) -> Result<Option<Vec<Placement>>> {
        match self.debouncer.poll() {
            Some(trigger) => {
                log::debug!("running {trigger:?} detection pass");
                self.run_pass().map(Some)
            }
            None => Ok(None),
        }
    }

    /// Runs a pass right away, superseding any scheduled one.
    pub fn detect_now(&mut self) -> Result<Vec<Placement>> {
        self.debouncer.cancel();
        self.run_pass()
    }

    fn schedule(&mut self, trigger: Trigger) {
        if !self.config.auto_detect {
            return;
        }
        let delay = match trigger {
            Trigger::Edit => self.config.debounce_delay(),
            Trigger::Immediate => self.config.immediate_delay(),
        };
        if let Some(superseded) = self.debouncer.schedule(delay, trigger) {
            log::trace!("dropping superseded {superseded:?} pass");
        }
    }

    /// On error the previous spots and waiting queue are left untouched.
    fn run_pass(&mut self) -> Result<Vec<Placement>> {
        let layout = self
            .cache
            .layout(&self.block, &self.measurer, &self.config.auto_fit);
        let mut spots = detect(
            self.canvas_size,
            &layout.lines,
            &self.block.padding(),
            self.config.min_spot_size,
        )?;
        let options = self.config.restore_options();

        // Older entries go first so the fill pass serves them first. The
        // queue is copied rather than drained so a failed restore keeps it.
        let saved = self
            .waiting
            .iter()
            .cloned()
            .chain(snapshot(&self.spots))
            .collect();

        let outcome = restore(&mut spots, saved, &self.resolver, &options)?;

        self.spots = spots;
        self.waiting = outcome.waiting;
        Ok(outcome.placements)
    }
}
