//! Bidi Run Resolution
//!
//! Resolves the characters of one line into runs of uniform embedding
//! level and reorders them visually.
//!
//! The resolver walks the line one character at a time, tracking the
//! start (`sor`) and end (`eor`) of the run being grown and the previous
//! position (`last`). The resolver status remembers the direction at the
//! end of the run, the last strong type and the last resolved type. A
//! change of direction closes the run through `append_run`, which splits
//! it further at collapsed-whitespace midpoints. Embedding changes come
//! from explicit formatting characters and from `unicode-bidi` on inline
//! flows entered and left by the walk.

use std::rc::Rc;

use fos_text::{is_justification_space, BidiClass, BidiContext, BidiStatus, Level};

use crate::iterator::{next_object, BidiIterator};
use crate::layout_tree::{NodeId, RenderTree};
use crate::line_box::BoxId;
use crate::midpoint::{Midpoints, EXCLUDE_OBJECT};

use BidiClass::*;

/// A maximal slice of one object at one embedding level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidiRun {
    pub obj: NodeId,
    pub start: usize,
    pub stop: usize,
    pub level: Level,
    pub(crate) inline_box: Option<BoxId>,
}

impl BidiRun {
    /// Level of a run of resolved type `dir` inside `context`
    pub fn new(obj: NodeId, start: usize, stop: usize, context: &BidiContext, dir: BidiClass) -> Self {
        let dir = if dir == ON { context.dir() } else { dir };
        let base = context.level().0;
        let level = if base % 2 == 1 {
            if matches!(dir, L | AN | EN) { base + 1 } else { base }
        } else {
            match dir {
                R => base + 1,
                AN | EN => base + 2,
                _ => base,
            }
        };
        Self {
            obj,
            start,
            stop,
            level: Level(level),
            inline_box: None,
        }
    }
}

/// Resolver state that survives from line to line
#[derive(Debug, Clone)]
pub struct BidiState {
    pub sor: BidiIterator,
    pub eor: BidiIterator,
    pub last: BidiIterator,
    pub current: BidiIterator,
    pub context: Rc<BidiContext>,
    pub status: BidiStatus,
}

impl BidiState {
    /// Paragraph start state for a block of the given direction
    pub fn new(block: NodeId, rtl: bool, is_override: bool) -> Self {
        let start = BidiIterator::new(block, None, 0);
        let mut status = BidiStatus::default();
        status.eor = if rtl { R } else { L };
        Self {
            sor: start,
            eor: start,
            last: start,
            current: start,
            context: BidiContext::root(rtl, is_override),
            status,
        }
    }

    /// Apply embeddings crossed outside run resolution
    pub fn apply_embeddings(&mut self, embeds: &[BidiClass], max_level: u8) {
        for &embed in embeds {
            if embed == PDF {
                let Some(parent) = self.context.parent().cloned() else {
                    continue;
                };
                self.status.last = self.context.dir();
                self.context = parent;
                self.status.last_strong = self.context.dir();
            } else {
                let (run_dir, is_override) = explicit_direction(embed);
                if let Some(context) = self.context.push(run_dir, is_override, max_level) {
                    self.context = context;
                    self.status.last = run_dir;
                    self.status.last_strong = run_dir;
                    self.status.eor = run_dir;
                }
            }
        }
    }
}

fn explicit_direction(embed: BidiClass) -> (BidiClass, bool) {
    let dir = if matches!(embed, RLE | RLO) { R } else { L };
    (dir, matches!(embed, LRO | RLO))
}

/// Runs of one line in visual order
#[derive(Debug, Clone, Default)]
pub struct ResolvedLine {
    pub runs: Vec<BidiRun>,
    /// Justification opportunities in the runs
    pub num_spaces: usize,
}

/// Resolve `[start, end)` into runs and reorder them unless the block's
/// text is visually ordered.
pub fn reorder_line(
    tree: &RenderTree,
    state: &mut BidiState,
    midpoints: &mut Midpoints,
    start: BidiIterator,
    end: BidiIterator,
    max_level: u8,
    visually_ordered: bool,
) -> ResolvedLine {
    let mut resolver = RunResolver {
        tree,
        state,
        midpoints,
        line: ResolvedLine::default(),
        dir: ON,
        empty_run: true,
        max_level,
    };
    resolver.midpoints.reset_cursor();
    if start != end {
        resolver.resolve(start, end);
    }

    let mut line = resolver.line;
    if !visually_ordered {
        reorder_visually(&mut line.runs, |run| run.level.0);
    }
    tracing::trace!(runs = line.runs.len(), spaces = line.num_spaces, "line resolved");
    line
}

/// Rule L2: from the highest level down to the lowest odd one, reverse
/// every maximal sequence of items at that level or above.
pub fn reorder_visually<T>(items: &mut [T], level: impl Fn(&T) -> u8) {
    let Some(high) = items.iter().map(&level).max() else {
        return;
    };
    let low = items.iter().map(&level).min().unwrap_or(0) | 1;

    let mut current = high;
    while current >= low {
        let mut i = 0;
        while i < items.len() {
            while i < items.len() && level(&items[i]) < current {
                i += 1;
            }
            let start = i;
            while i < items.len() && level(&items[i]) >= current {
                i += 1;
            }
            items[start..i].reverse();
        }
        current -= 1;
    }
}

struct RunResolver<'a> {
    tree: &'a RenderTree,
    state: &'a mut BidiState,
    midpoints: &'a mut Midpoints,
    line: ResolvedLine,
    dir: BidiClass,
    empty_run: bool,
    max_level: u8,
}

impl RunResolver<'_> {
    fn resolve(&mut self, start: BidiIterator, end: BidiIterator) {
        self.state.current = start;
        self.state.last = start;
        let mut at_end = false;
        let mut embeds = Vec::new();

        loop {
            let class = if at_end {
                if self.state.current.at_end() {
                    let mut context = &self.state.context;
                    while let Some(parent) = context.parent() {
                        context = parent;
                    }
                    context.dir()
                } else {
                    self.state.context.dir()
                }
            } else if self.state.context.is_override() {
                self.state.context.dir()
            } else {
                self.state.current.direction(self.tree)
            };

            let resolved = self.step(class);
            if self.state.current.at_end() {
                break;
            }
            self.record_last(resolved);
            if at_end {
                break;
            }

            self.state.last = self.state.current;
            if self.empty_run {
                self.state.sor = self.state.current;
                self.state.eor = self.state.current;
                self.empty_run = false;
            }

            embeds.clear();
            self.state.current.increment(self.tree, Some(&mut embeds), true);
            for &embed in &embeds {
                if !self.empty_run {
                    self.embed(embed);
                }
            }

            if self.state.current == end {
                if self.empty_run {
                    break;
                }
                at_end = true;
            }
        }

        if !self.empty_run && self.state.sor != self.state.current {
            self.state.eor = self.state.last;
            self.append_run();
        }
    }

    /// Resolve one character class, returning the type it counts as
    fn step(&mut self, class: BidiClass) -> BidiClass {
        match class {
            LRE | RLE | LRO | RLO | PDF => {
                self.embed(class);
                class
            }
            L => {
                self.on_left();
                L
            }
            R | AL => {
                self.on_right(class);
                class
            }
            EN if self.state.status.last_strong != AL => {
                self.on_european_number();
                EN
            }
            EN | AN => {
                self.on_arabic_number();
                AN
            }
            ET if self.state.status.last == EN => {
                self.state.eor = self.state.current;
                self.state.status.eor = EN;
                EN
            }
            other => other,
        }
    }

    fn record_last(&mut self, resolved: BidiClass) {
        let status = &mut self.state.status;
        match resolved {
            ET | ES | CS | S | WS | ON => {
                status.last = if matches!(status.last, L | R | AL | EN | AN) { resolved } else { ON };
            }
            NSM | BN => {}
            EN if status.last == L => {}
            _ => status.last = resolved,
        }
    }

    fn on_left(&mut self) {
        if self.dir == ON {
            self.dir = L;
        }
        match self.state.status.last {
            L => self.extend(L),
            R | AL | EN | AN => {
                self.append_run();
                self.dir = L;
                self.extend(L);
            }
            ES | ET | CS | BN | B | S | WS | ON => {
                if self.state.status.eor == L {
                    self.extend(L);
                } else if self.state.context.dir() == L || self.state.status.last_strong == L {
                    if !matches!(self.state.status.eor, EN | AN | ON) {
                        self.append_run();
                    }
                    self.dir = L;
                    self.extend(L);
                } else {
                    if matches!(self.state.status.eor, EN | AN) {
                        self.dir = self.state.status.eor;
                        self.append_run();
                    }
                    self.dir = R;
                    self.state.eor = self.state.last;
                    self.append_run();
                    self.dir = L;
                    self.state.status.eor = L;
                }
            }
            _ => {}
        }
        self.state.status.last_strong = L;
    }

    fn on_right(&mut self, class: BidiClass) {
        if self.dir == ON {
            self.dir = R;
        }
        match self.state.status.last {
            R | AL => self.extend(R),
            L | EN | AN => {
                self.append_run();
                self.dir = R;
                self.extend(R);
            }
            ES | ET | CS | BN | B | S | WS | ON => {
                if matches!(self.state.status.eor, R | AL) {
                    self.extend(R);
                } else if self.state.context.dir() == R || matches!(self.state.status.last_strong, R | AL) {
                    self.append_run();
                    self.dir = R;
                    self.extend(R);
                } else {
                    self.dir = L;
                    self.state.eor = self.state.last;
                    self.append_run();
                    self.dir = R;
                    self.state.status.eor = R;
                }
            }
            _ => {}
        }
        self.state.status.last_strong = class;
    }

    fn on_european_number(&mut self) {
        if self.dir == ON {
            self.dir = L;
        }
        match self.state.status.last {
            ET => {
                if matches!(self.state.status.last_strong, R | AL) {
                    self.append_run();
                    self.dir = EN;
                    self.state.status.eor = EN;
                }
                self.extend(EN);
            }
            EN | L => self.extend(EN),
            R | AL | AN => {
                self.append_run();
                self.state.status.eor = EN;
                self.dir = EN;
            }
            ES | CS if self.state.status.eor == EN => self.state.eor = self.state.current,
            ES | CS | BN | B | S | WS | ON => self.neutral_before_number(EN),
            _ => {}
        }
    }

    fn on_arabic_number(&mut self) {
        if self.dir == ON {
            self.dir = AN;
        }
        match self.state.status.last {
            L | AN => self.extend(AN),
            R | AL | EN => {
                self.append_run();
                self.dir = AN;
                self.state.status.eor = AN;
            }
            CS if self.state.status.eor == AN => self.state.eor = self.state.current,
            ES | CS | ET | BN | B | S | WS | ON => self.neutral_before_number(AN),
            _ => {}
        }
    }

    /// A number following neutrals
    fn neutral_before_number(&mut self, number: BidiClass) {
        let status = self.state.status;
        if status.eor == R {
            self.state.eor = self.state.last;
            self.append_run();
            self.dir = number;
            self.state.status.eor = number;
        } else if status.eor == L || (status.eor == EN && status.last_strong == L) {
            self.extend(number);
        } else if self.dir != L {
            self.append_run();
            self.state.eor = self.state.last;
            self.dir = R;
            self.append_run();
            self.dir = number;
            self.state.status.eor = number;
        } else {
            self.extend(number);
        }
    }

    /// Grow the current run over the current character
    fn extend(&mut self, eor: BidiClass) {
        self.state.eor = self.state.current;
        self.state.status.eor = eor;
    }

    fn embed(&mut self, embed: BidiClass) {
        if embed == PDF {
            let Some(parent) = self.state.context.parent().cloned() else {
                return;
            };
            self.close_before_embedding();
            self.state.status.last = self.state.context.dir();
            self.state.context = parent;
            let context = &self.state.context;
            self.dir = if context.is_override() { context.dir() } else { ON };
            self.state.status.last_strong = context.dir();
        } else {
            let (run_dir, is_override) = explicit_direction(embed);
            let Some(context) = self.state.context.push(run_dir, is_override, self.max_level) else {
                return;
            };
            self.close_before_embedding();
            self.state.context = context;
            self.dir = run_dir;
            self.state.status.last = run_dir;
            self.state.status.last_strong = run_dir;
            self.state.status.eor = run_dir;
        }
    }

    fn close_before_embedding(&mut self) {
        if self.state.eor != self.state.last {
            self.append_run();
            self.state.eor = self.state.last;
        }
        self.append_run();
        self.empty_run = true;
    }

    /// Close the run `[sor, eor]` and start a new one after `eor`
    fn append_run(&mut self) {
        if self.empty_run {
            return;
        }
        let sor = self.state.sor;
        let eor = self.state.eor;

        let mut start = sor.pos;
        let mut obj = sor.obj;
        while let Some(o) = obj {
            if Some(o) == eor.obj {
                break;
            }
            self.append_runs_for_object(start, self.tree.length(o), o);
            start = 0;
            obj = next_object(self.tree, sor.block, Some(o), true, None, None);
        }
        if let Some(o) = obj {
            self.append_runs_for_object(start, eor.pos + 1, o);
        }

        self.state.eor.increment(self.tree, None, true);
        self.state.sor = self.state.eor;
        self.dir = ON;
        self.state.status.eor = ON;
    }

    /// Add `[start, end)` of `obj`, leaving out collapsed whitespace
    fn append_runs_for_object(&mut self, mut start: usize, end: usize, obj: NodeId) {
        let tree = self.tree;
        if start > end
            || tree.is_floating(obj)
            || (tree.is_positioned(obj) && !tree.has_static_x(obj) && !tree.has_static_y(obj))
        {
            return;
        }

        loop {
            let next = self.midpoints.peek().filter(|m| m.obj == Some(obj));
            if self.midpoints.between {
                let Some(midpoint) = next else {
                    return;
                };
                self.midpoints.between = false;
                self.midpoints.current += 1;
                start = midpoint.pos;
                if start < end {
                    continue;
                }
                return;
            }

            let Some(midpoint) = next else {
                self.add_run(start, end, obj);
                return;
            };
            let stop = if midpoint.pos == EXCLUDE_OBJECT { 0 } else { midpoint.pos + 1 };
            if stop > end {
                self.add_run(start, end, obj);
                return;
            }

            self.midpoints.between = true;
            self.midpoints.current += 1;
            if midpoint.pos == EXCLUDE_OBJECT {
                return;
            }
            if !midpoint.exclusive {
                self.add_run(start, stop, obj);
            }
            start = stop;
        }
    }

    fn add_run(&mut self, start: usize, stop: usize, obj: NodeId) {
        let tree = self.tree;
        if tree.is_text(obj) {
            let text = tree.text(obj);
            let stop = stop.min(text.len());
            if start >= stop {
                return;
            }
            self.line.num_spaces += text[start..stop].iter().filter(|&&c| is_justification_space(c)).count();
            self.line.runs.push(BidiRun::new(obj, start, stop, &self.state.context, self.dir));
        } else {
            self.line.runs.push(BidiRun::new(obj, start, stop, &self.state.context, self.dir));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_css::ComputedStyle;

    fn resolve(text: &str, rtl: bool) -> (RenderTree, Vec<(String, u8)>) {
        let mut tree = RenderTree::new();
        let block = tree.create_block(ComputedStyle::block());
        let node = tree.create_text(text);
        tree.append_child(block, node).unwrap();

        let mut state = BidiState::new(block, rtl, false);
        let mut midpoints = Midpoints::new();
        let start = BidiIterator::new(block, Some(node), 0);
        let end = BidiIterator::new(block, None, 0);
        let line = reorder_line(&tree, &mut state, &mut midpoints, start, end, 61, false);

        let chars = tree.text(node).to_vec();
        let runs = line
            .runs
            .iter()
            .map(|run| (chars[run.start..run.stop].iter().collect(), run.level.0))
            .collect();
        (tree, runs)
    }

    #[test]
    fn test_run_levels() {
        let ctx = BidiContext::root(false, false);
        assert_eq!(BidiRun::new(NodeId(0), 0, 1, &ctx, ON).level, Level(0));
        assert_eq!(BidiRun::new(NodeId(0), 0, 1, &ctx, R).level, Level(1));
        assert_eq!(BidiRun::new(NodeId(0), 0, 1, &ctx, EN).level, Level(2));

        let rtl = BidiContext::root(true, false);
        assert_eq!(BidiRun::new(NodeId(0), 0, 1, &rtl, ON).level, Level(1));
        assert_eq!(BidiRun::new(NodeId(0), 0, 1, &rtl, L).level, Level(2));
        assert_eq!(BidiRun::new(NodeId(0), 0, 1, &rtl, AN).level, Level(2));
    }

    #[test]
    fn test_pure_ltr_is_one_run() {
        let (_, runs) = resolve("hello world", false);
        assert_eq!(runs, vec![("hello world".to_string(), 0)]);
    }

    #[test]
    fn test_mixed_runs() {
        let (_, runs) = resolve("abc אבג def", false);
        let levels: Vec<u8> = runs.iter().map(|r| r.1).collect();
        assert_eq!(levels, vec![0, 1, 0]);
        assert_eq!(runs[1].0, "אבג");
        assert_eq!(runs.iter().map(|r| r.0.chars().count()).sum::<usize>(), 11);
    }

    #[test]
    fn test_rtl_paragraph_reverses() {
        let (_, runs) = resolve("אב cd", true);
        // Visual order: the LTR run first, then the RTL run
        assert_eq!(runs.first().map(|r| r.1), Some(2));
        assert_eq!(runs.last().map(|r| r.1), Some(1));
        assert_eq!(runs.first().map(|r| r.0.as_str()), Some("cd"));
    }

    #[test]
    fn test_latin_between_hebrew_stays_ltr() {
        let (_, runs) = resolve("אaא", false);
        assert_eq!(
            runs,
            vec![("א".to_string(), 1), ("a".to_string(), 0), ("א".to_string(), 1)]
        );
    }

    #[test]
    fn test_numbers_after_rtl() {
        let (_, runs) = resolve("א 12", false);
        assert!(runs.iter().any(|(text, level)| text == "12" && *level == 2));
    }

    #[test]
    fn test_reorder_visually() {
        let mut items = vec![0u8, 1, 1, 2, 2, 1, 0];
        let labels: Vec<usize> = (0..items.len()).collect();
        let mut pairs: Vec<(usize, u8)> = labels.into_iter().zip(items.drain(..)).collect();
        reorder_visually(&mut pairs, |p| p.1);
        let order: Vec<usize> = pairs.iter().map(|p| p.0).collect();
        assert_eq!(order, vec![0, 5, 3, 4, 2, 1, 6]);
    }

    #[test]
    fn test_apply_embeddings() {
        let mut state = BidiState::new(NodeId(0), false, false);
        state.apply_embeddings(&[RLE, LRO], 61);
        assert_eq!(state.context.level(), Level(2));
        assert!(state.context.is_override());
        state.apply_embeddings(&[PDF, PDF, PDF], 61);
        assert_eq!(state.context.level(), Level(0));
        assert_eq!(state.status.last_strong, L);
    }

    quickcheck::quickcheck! {
        fn prop_reorder_twice_is_identity(levels: Vec<u8>) -> bool {
            let original: Vec<(usize, u8)> = levels.iter().map(|l| l % 8).enumerate().collect();
            let mut items = original.clone();
            reorder_visually(&mut items, |p| p.1);
            reorder_visually(&mut items, |p| p.1);
            items == original
        }
    }
}
