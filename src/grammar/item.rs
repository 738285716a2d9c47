//! LR(1) item sets: `CLOSURE`, `GOTO`, and the canonical collection, grounded on the
//! `closure`/`goto`/`items` methods of the original's `LR1Grammar` (SPEC_FULL §C). Also
//! provides the LALR(1) merge that groups canonical states sharing an LR(0) core.

use super::sets::SymbolSets;
use super::{Grammar, GrammarSymbol, Nonterminal, Terminal};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

/// `[A -> α.β, a]`: a production (by owning nonterminal and right-hand side), a dot
/// position, and a single lookahead terminal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lr1Item {
    pub lhs: Nonterminal,
    pub rhs: Rc<[GrammarSymbol]>,
    pub dot: usize,
    pub lookahead: Terminal,
}

impl Lr1Item {
    pub fn symbol_after_dot(&self) -> Option<&GrammarSymbol> {
        self.rhs.get(self.dot)
    }

    pub fn is_complete(&self) -> bool {
        self.dot >= self.rhs.len()
    }

    fn lr0_core(&self) -> (Nonterminal, Rc<[GrammarSymbol]>, usize) {
        (self.lhs.clone(), self.rhs.clone(), self.dot)
    }
}

pub type ItemSet = BTreeSet<Lr1Item>;

/// The canonical LR(1) collection: numbered item sets plus the shift/goto transitions
/// between them over grammar symbols.
pub struct CanonicalCollection {
    pub states: Vec<ItemSet>,
    pub transitions: HashMap<(usize, GrammarSymbol), usize>,
    pub start_state: usize,
    /// The synthetic `S'` introduced so the accepting reduction (`S' -> S .`) is always
    /// distinguishable from every other reduction of the start symbol.
    pub augmented_start: Nonterminal,
}

fn symbols_after_dot(items: &ItemSet) -> BTreeSet<GrammarSymbol> {
    items.iter().filter_map(|item| item.symbol_after_dot().cloned()).collect()
}

/// Closes `items` under the standard LR(1) closure rule: for `[A -> α.Bβ, a]`, adds
/// `[B -> .γ, b]` for every production `B -> γ` and every `b` in `FIRST(βa)`.
pub fn closure(grammar: &Grammar, sets: &SymbolSets, items: ItemSet) -> ItemSet {
    let mut result = items;
    loop {
        let mut added = Vec::new();
        for item in &result {
            let Some(GrammarSymbol::Nonterminal(b)) = item.symbol_after_dot() else {
                continue;
            };
            let mut lookahead_seq: Vec<GrammarSymbol> = item.rhs[item.dot + 1..].to_vec();
            lookahead_seq.push(GrammarSymbol::Terminal(item.lookahead.clone()));
            let first_set = sets.first_of_sequence(&lookahead_seq);

            for production in grammar.productions_of(b) {
                for terminal in first_set.iter().filter(|t| !matches!(t, Terminal::Epsilon)) {
                    let new_item = Lr1Item {
                        lhs: b.clone(),
                        rhs: Rc::from(production.0.clone()),
                        dot: 0,
                        lookahead: terminal.clone(),
                    };
                    if !result.contains(&new_item) {
                        added.push(new_item);
                    }
                }
            }
        }
        if added.is_empty() {
            return result;
        }
        result.extend(added);
    }
}

/// `GOTO(items, symbol)`: advance every item whose next symbol matches, then close.
pub fn goto(grammar: &Grammar, sets: &SymbolSets, items: &ItemSet, symbol: &GrammarSymbol) -> ItemSet {
    let moved: ItemSet = items
        .iter()
        .filter(|item| item.symbol_after_dot() == Some(symbol))
        .map(|item| Lr1Item {
            dot: item.dot + 1,
            ..item.clone()
        })
        .collect();
    closure(grammar, sets, moved)
}

/// Builds the canonical LR(1) collection, starting from the closure of the augmented item
/// `[S' -> .S, $]`.
pub fn build_canonical_collection(grammar: &Grammar, sets: &SymbolSets) -> CanonicalCollection {
    let augmented_start = grammar.derive_from(&grammar.start_symbol);
    let initial_rhs: Rc<[GrammarSymbol]> =
        Rc::from(vec![GrammarSymbol::Nonterminal(grammar.start_symbol.clone())]);
    let initial_item = Lr1Item {
        lhs: augmented_start.clone(),
        rhs: initial_rhs,
        dot: 0,
        lookahead: Terminal::EndOfInput,
    };
    let start_items = closure(grammar, sets, ItemSet::from([initial_item]));

    const LOG_EVERY: usize = 32;

    let mut states = vec![start_items.clone()];
    let mut index_of: HashMap<ItemSet, usize> = HashMap::from([(start_items, 0)]);
    let mut transitions = HashMap::new();
    let mut queue = vec![0usize];

    while let Some(i) = queue.pop() {
        let items = states[i].clone();
        for symbol in symbols_after_dot(&items) {
            let target = goto(grammar, sets, &items, &symbol);
            if target.is_empty() {
                continue;
            }
            let idx = match index_of.get(&target) {
                Some(&idx) => idx,
                None => {
                    let idx = states.len();
                    states.push(target.clone());
                    index_of.insert(target, idx);
                    queue.push(idx);
                    log::trace!("canonical collection: discovered state {idx} via goto({i}, {symbol})");
                    if idx % LOG_EVERY == 0 {
                        log::debug!("canonical collection: {idx} states discovered so far");
                    }
                    idx
                }
            };
            transitions.insert((i, symbol), idx);
        }
    }

    log::debug!("canonical collection: finished with {} states", states.len());

    CanonicalCollection {
        states,
        transitions,
        start_state: 0,
        augmented_start,
    }
}

/// Merges canonical states that share an LR(0) core (same productions and dot positions,
/// lookaheads ignored) into single LALR(1) states, unioning their lookaheads. This is the
/// "merge by core" construction (Dragon Book §4.7.3) rather than a from-scratch LALR
/// build, since the canonical collection is already available.
pub fn merge_lalr(collection: &CanonicalCollection) -> CanonicalCollection {
    let mut core_to_group: HashMap<BTreeSet<(Nonterminal, Rc<[GrammarSymbol]>, usize)>, usize> =
        HashMap::new();
    let mut merged_states: Vec<ItemSet> = Vec::new();
    let mut state_to_group: Vec<usize> = Vec::with_capacity(collection.states.len());

    for items in &collection.states {
        let core: BTreeSet<_> = items.iter().map(Lr1Item::lr0_core).collect();
        let group = *core_to_group.entry(core).or_insert_with(|| {
            merged_states.push(ItemSet::new());
            merged_states.len() - 1
        });
        merged_states[group].extend(items.iter().cloned());
        state_to_group.push(group);
    }

    let mut transitions = HashMap::new();
    for ((from, symbol), to) in &collection.transitions {
        transitions.insert((state_to_group[*from], symbol.clone()), state_to_group[*to]);
    }

    CanonicalCollection {
        states: merged_states,
        transitions,
        start_state: state_to_group[collection.start_state],
        augmented_start: collection.augmented_start.clone(),
    }
}
