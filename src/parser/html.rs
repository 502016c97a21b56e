//! Draw result extraction from rendered HTML
//!
//! The extractor picks one of two strategies per document:
//!
//! 1. **Structured**: the header card exists. Each date label inside it is
//!    scoped to its closest `div`, widened towards the card only while no
//!    other date label is swallowed. The draw time comes from the label's
//!    own icon.
//! 2. **Fallback**: no card. Every date label in the document is scoped to
//!    its closest enclosing `div`; the icon may sit anywhere in that `div`.
//!
//! Both strategies share the same per-block extraction. A block that fails
//! any step is dropped; extraction itself never fails.

use scraper::{ElementRef, Html};

use crate::metrics;
use crate::models::{DrawRecord, DrawTime, Game};
use crate::parser::date::normalize_date;
use crate::parser::selectors::DrawSelectors;

/// Page layout, resolved once per document
#[derive(Debug, Clone, Copy)]
pub enum Layout<'a> {
    /// Header card found; holds the first card element
    Structured(ElementRef<'a>),
    /// Header card absent
    Unstructured,
}

impl Layout<'_> {
    pub fn strategy(&self) -> ExtractionStrategy {
        match self {
            Layout::Structured(_) => ExtractionStrategy::Structured,
            Layout::Unstructured => ExtractionStrategy::Fallback,
        }
    }
}

/// Which strategy produced a set of records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    Structured,
    Fallback,
}

impl ExtractionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStrategy::Structured => "structured",
            ExtractionStrategy::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a candidate block was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnknownDrawTime,
    NoScope,
    NoNumbersList,
    InvalidDate,
    EmptyNumbers,
    MalformedNumbers,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::UnknownDrawTime => "unknown_draw_time",
            SkipReason::NoScope => "no_scope",
            SkipReason::NoNumbersList => "no_numbers_list",
            SkipReason::InvalidDate => "invalid_date",
            SkipReason::EmptyNumbers => "empty_numbers",
            SkipReason::MalformedNumbers => "malformed_numbers",
        }
    }
}

/// Result of extracting one document
#[derive(Debug, Clone)]
pub struct Extraction {
    pub strategy: ExtractionStrategy,
    pub records: Vec<DrawRecord>,
    pub skipped: Vec<SkipReason>,
}

/// Extracts draw records from a rendered results page
pub struct DrawExtractor {
    selectors: DrawSelectors,
}

impl DrawExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            selectors: DrawSelectors::new(),
        }
    }

    /// Parse raw HTML and extract its draws
    pub fn extract_html(&self, html: &str, game: Game) -> Vec<DrawRecord> {
        let document = Html::parse_document(html);
        self.extract(&document, game)
    }

    /// Extract draws in document order
    pub fn extract(&self, document: &Html, game: Game) -> Vec<DrawRecord> {
        self.extract_with_layout(document, game).records
    }

    /// Extract draws and report the strategy used and the dropped blocks
    pub fn extract_with_layout(&self, document: &Html, game: Game) -> Extraction {
        let layout = self.detect_layout(document);
        let strategy = layout.strategy();
        tracing::debug!(game = %game, strategy = %strategy, "Resolved page layout");

        let mut records = Vec::new();
        let mut skipped = Vec::new();

        let outcomes: Vec<Result<DrawRecord, SkipReason>> = match layout {
            Layout::Structured(card) => card
                .select(self.selectors.date_label)
                .map(|label| {
                    let scope = self.structured_scope(label, card);
                    self.extract_block(game, strategy, label, scope)
                })
                .collect(),
            Layout::Unstructured => {
                tracing::info!(game = %game, "Header card not found, scanning whole document");
                document
                    .select(self.selectors.date_label)
                    .map(|label| self.extract_block(game, strategy, label, closest_div(label)))
                    .collect()
            }
        };

        for outcome in outcomes {
            match outcome {
                Ok(record) => records.push(record),
                Err(reason) => {
                    metrics::record_block_skipped(game.as_str(), reason.as_str());
                    skipped.push(reason);
                }
            }
        }

        metrics::record_draws_extracted(game.as_str(), strategy.as_str(), records.len());
        tracing::info!(
            game = %game,
            strategy = %strategy,
            records = records.len(),
            skipped = skipped.len(),
            "Extraction finished"
        );

        Extraction {
            strategy,
            records,
            skipped,
        }
    }

    /// Resolve the layout: first header card, if any
    pub fn detect_layout<'a>(&self, document: &'a Html) -> Layout<'a> {
        match document.select(self.selectors.card).next() {
            Some(card) => Layout::Structured(card),
            None => Layout::Unstructured,
        }
    }

    /// Block owning `label` inside `card`
    ///
    /// Starts at the label's closest `div`. While that holds no numbers list
    /// it widens to the parent, but never past the card and never into an
    /// element holding a second date label. The card itself is only a scope
    /// when it holds a single label.
    fn structured_scope<'a>(
        &self,
        label: ElementRef<'a>,
        card: ElementRef<'a>,
    ) -> Option<ElementRef<'a>> {
        let mut scope = closest_div(label)?;
        if scope == card && self.holds_several_labels(card) {
            return None;
        }

        while scope != card && scope.select(self.selectors.numbers_list).next().is_none() {
            match scope.parent().and_then(ElementRef::wrap) {
                Some(parent) if !self.holds_several_labels(parent) => scope = parent,
                _ => break,
            }
        }

        Some(scope)
    }

    fn holds_several_labels(&self, element: ElementRef<'_>) -> bool {
        element.select(self.selectors.date_label).nth(1).is_some()
    }

    fn extract_block(
        &self,
        game: Game,
        strategy: ExtractionStrategy,
        label: ElementRef<'_>,
        scope: Option<ElementRef<'_>>,
    ) -> Result<DrawRecord, SkipReason> {
        let icon_scope = match strategy {
            ExtractionStrategy::Structured => None,
            ExtractionStrategy::Fallback => scope,
        };
        let draw_time = self.draw_time(label, icon_scope).ok_or_else(|| {
            tracing::debug!(game = %game, "Skipping block without a valid draw time");
            SkipReason::UnknownDrawTime
        })?;

        let scope = scope.ok_or_else(|| {
            tracing::debug!(
                game = %game,
                draw_time = %draw_time,
                "Skipping block without a container"
            );
            SkipReason::NoScope
        })?;

        let list = scope
            .select(self.selectors.numbers_list)
            .next()
            .ok_or_else(|| {
                tracing::warn!(game = %game, draw_time = %draw_time, "No numbers list in block");
                SkipReason::NoNumbersList
            })?;

        let raw_date = own_text(label);
        let date = normalize_date(&raw_date).map_err(|e| {
            tracing::warn!(
                game = %game,
                draw_time = %draw_time,
                error = %e,
                "Skipping block with unparseable date"
            );
            SkipReason::InvalidDate
        })?;

        let numbers: String = list
            .select(self.selectors.number_leaf)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .collect();

        if numbers.is_empty() {
            tracing::warn!(game = %game, draw_time = %draw_time, "No numbers found in block");
            return Err(SkipReason::EmptyNumbers);
        }

        if numbers.len() != game.digit_count() || !numbers.chars().all(|c| c.is_ascii_digit()) {
            tracing::warn!(
                game = %game,
                draw_time = %draw_time,
                numbers = %numbers,
                "Numbers do not match game format"
            );
            return Err(SkipReason::MalformedNumbers);
        }

        let fireball = self.fireball(list);

        tracing::debug!(
            game = %game,
            draw_time = %draw_time,
            date = %date,
            numbers = %numbers,
            fireball = %fireball,
            "Extracted draw"
        );

        Ok(DrawRecord {
            game,
            draw_time,
            date,
            numbers,
            fireball,
        })
    }

    /// Icon title inside the label, else inside `scope` when one is given
    fn draw_time(
        &self,
        label: ElementRef<'_>,
        scope: Option<ElementRef<'_>>,
    ) -> Option<DrawTime> {
        let title = label
            .select(self.selectors.time_icon_title)
            .next()
            .or_else(|| scope.and_then(|s| s.select(self.selectors.time_icon_title).next()))?;

        DrawTime::from_label(&title.text().collect::<String>())
    }

    fn fireball(&self, list: ElementRef<'_>) -> String {
        let text = list
            .select(self.selectors.bonus_leaf)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        if text.is_empty() || (text.len() == 1 && text.chars().all(|c| c.is_ascii_digit())) {
            text
        } else {
            tracing::warn!(fireball = %text, "Ignoring malformed fireball");
            String::new()
        }
    }
}

impl Default for DrawExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Closest enclosing `div` of an element
fn closest_div(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "div")
}

/// Text of the element's direct text children, nested elements excluded
fn own_text(element: ElementRef<'_>) -> String {
    element
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| &**text)
        .collect::<Vec<&str>>()
        .join(" ")
}
