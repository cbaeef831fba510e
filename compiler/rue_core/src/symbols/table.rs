//! The symbol table and its lookup/mutation operations.

use rustc_hash::FxHashSet;

use crate::{
    File, FileId, FileTable, Loc, Name, StrictLevel, StringInterner, Type, WellKnownNames,
};

use super::{ArgInfo, Symbol, SymbolFlags, SymbolKind, SymbolRef};

/// Cap on ancestry/alias traversal. Real hierarchies are shallow; this only
/// bounds traversal while circular ancestry errors are still being detected.
const MAX_ANCESTRY_DEPTH: usize = 128;

/// Namespaces for [`SymbolTable::fresh_name_unique`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UniqueNameKind {
    /// A symbol displaced by a rename (e.g. the primary symbol of an
    /// overloaded method).
    MangleRename,
    /// One overload of a method.
    Overload,
    /// A per-method type variable.
    TypeVar,
}

impl UniqueNameKind {
    fn tag(self) -> &'static str {
        match self {
            UniqueNameKind::MangleRename => "mangled",
            UniqueNameKind::Overload => "overload",
            UniqueNameKind::TypeVar => "typevar",
        }
    }
}

/// One fuzzy-match candidate from [`SymbolTable::find_member_fuzzy_match`].
#[derive(Clone, Copy, Debug)]
pub struct FuzzyMatch {
    pub symbol: SymbolRef,
    pub distance: usize,
}

/// The process-wide symbol table for one run of the checker.
///
/// Owns the string interner, the file table and the symbol arena. Created
/// with the distinguished sentinel symbols already entered; the namer then
/// appends user symbols, and the resolver mutates their payload fields
/// (superclasses, mixins, result types) without ever deleting anything.
pub struct SymbolTable {
    pub interner: StringInterner,
    pub names: WellKnownNames,
    pub files: FileTable,
    symbols: Vec<Symbol>,
    /// Counter feeding mangle renames, so displaced names never collide.
    next_mangle: u32,
}

impl SymbolTable {
    /// Create a table holding only the distinguished symbols.
    pub fn new() -> Self {
        let interner = StringInterner::new();
        let names = WellKnownNames::intern(&interner);
        let mut table = SymbolTable {
            interner,
            names,
            files: FileTable::new(),
            symbols: Vec::with_capacity(64),
            next_mangle: 0,
        };
        table.enter_sentinels();
        table
    }

    fn enter_sentinels(&mut self) {
        let sentinel = |table: &mut Self,
                        expected: SymbolRef,
                        kind: SymbolKind,
                        owner: SymbolRef,
                        name: &str| {
            let name = table.interner.intern(name);
            let entered = table.push_symbol(Symbol::new(kind, owner, name, Loc::NONE));
            debug_assert_eq!(entered, expected);
            entered
        };

        sentinel(self, SymbolRef::NONE, SymbolKind::Module, SymbolRef::NONE, "<none>");
        sentinel(self, SymbolRef::ROOT, SymbolKind::Module, SymbolRef::ROOT, "<root>");
        sentinel(self, SymbolRef::TODO, SymbolKind::Class, SymbolRef::ROOT, "<todo>");
        sentinel(self, SymbolRef::OBJECT, SymbolKind::Class, SymbolRef::ROOT, "Object");
        sentinel(self, SymbolRef::BASIC_OBJECT, SymbolKind::Class, SymbolRef::ROOT, "BasicObject");
        sentinel(self, SymbolRef::NIL_CLASS, SymbolKind::Class, SymbolRef::ROOT, "NilClass");
        sentinel(self, SymbolRef::T, SymbolKind::Module, SymbolRef::ROOT, "T");
        sentinel(self, SymbolRef::STUB_MODULE, SymbolKind::Module, SymbolRef::ROOT, "<StubModule>");
        sentinel(self, SymbolRef::STUB_SUPER_CLASS, SymbolKind::Class, SymbolRef::ROOT, "<StubSuperClass>");
        sentinel(self, SymbolRef::STUB_MIXIN, SymbolKind::Module, SymbolRef::ROOT, "<StubMixin>");
        sentinel(self, SymbolRef::UNTYPED, SymbolKind::Class, SymbolRef::ROOT, "<untyped>");
        sentinel(self, SymbolRef::BAD_ALIAS_METHOD_STUB, SymbolKind::Method, SymbolRef::ROOT, "<badAliasMethodStub>");

        // Wire up the initial hierarchy.
        self.symbol_mut(SymbolRef::OBJECT).superclass = SymbolRef::BASIC_OBJECT;
        self.symbol_mut(SymbolRef::BASIC_OBJECT).superclass = SymbolRef::TODO;
        self.symbol_mut(SymbolRef::NIL_CLASS).superclass = SymbolRef::OBJECT;
        self.symbol_mut(SymbolRef::STUB_SUPER_CLASS).superclass = SymbolRef::OBJECT;

        // Only the nameable ones become members of root.
        for sym in [
            SymbolRef::OBJECT,
            SymbolRef::BASIC_OBJECT,
            SymbolRef::NIL_CLASS,
            SymbolRef::T,
        ] {
            let name = self.symbol(sym).name;
            self.symbol_mut(SymbolRef::ROOT).members.insert(name, sym);
        }
    }

    fn push_symbol(&mut self, symbol: Symbol) -> SymbolRef {
        let id = u32::try_from(self.symbols.len()).expect("symbol table overflow");
        self.symbols.push(symbol);
        SymbolRef::from_raw(id)
    }

    /// Number of symbols, sentinels included.
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Iterate every real symbol handle (sentinels included, `NONE` excluded).
    pub fn symbol_refs(&self) -> impl Iterator<Item = SymbolRef> {
        (1..u32::try_from(self.symbols.len()).expect("symbol table overflow"))
            .map(SymbolRef::from_raw)
    }

    /// Read a symbol's data.
    #[inline]
    pub fn symbol(&self, sym: SymbolRef) -> &Symbol {
        &self.symbols[sym.raw() as usize]
    }

    /// Mutate a symbol's data.
    #[inline]
    pub fn symbol_mut(&mut self, sym: SymbolRef) -> &mut Symbol {
        &mut self.symbols[sym.raw() as usize]
    }

    /// Register a file. Convenience over [`FileTable::enter_file`].
    pub fn enter_file(
        &mut self,
        path: impl Into<String>,
        strict: StrictLevel,
        sigil: StrictLevel,
        permit_overloads: bool,
    ) -> FileId {
        self.files.enter_file(File {
            path: path.into(),
            strict,
            sigil,
            permit_overloads,
        })
    }

    // ===== Lookup =====

    /// Find a direct member of `owner` by name.
    pub fn find_member(&self, owner: SymbolRef, name: Name) -> SymbolRef {
        if !owner.exists() {
            return SymbolRef::NONE;
        }
        self.symbol(owner)
            .members
            .get(&name)
            .copied()
            .unwrap_or(SymbolRef::NONE)
    }

    /// Find a member of `owner` by name, searching mixins and the superclass
    /// chain after the direct members.
    pub fn find_member_transitive(&self, owner: SymbolRef, name: Name) -> SymbolRef {
        let mut current = owner;
        let mut seen: FxHashSet<SymbolRef> = FxHashSet::default();
        let mut depth = 0;
        while current.exists() && current != SymbolRef::TODO && depth < MAX_ANCESTRY_DEPTH {
            if !seen.insert(current) {
                break;
            }
            let data = self.symbol(current);
            if let Some(&found) = data.members.get(&name) {
                return found;
            }
            // Mixins shadow the superclass, latest inclusion first.
            for &mixin in data.mixins.iter().rev() {
                if seen.contains(&mixin) {
                    continue;
                }
                let found = self.find_member(mixin, name);
                if found.exists() {
                    return found;
                }
                seen.insert(mixin);
            }
            current = data.superclass;
            depth += 1;
        }
        SymbolRef::NONE
    }

    /// Rank members of `owner` (transitive) by edit distance to `name`.
    ///
    /// Candidates beyond a length-scaled threshold are dropped; ties resolve
    /// by name so output is deterministic. Used for "did you mean"
    /// suggestions on unresolved constants.
    pub fn find_member_fuzzy_match(
        &self,
        owner: SymbolRef,
        name: Name,
        max_results: usize,
    ) -> Vec<FuzzyMatch> {
        let target = self.interner.lookup(name);
        if target.is_empty() {
            return Vec::new();
        }
        let threshold = fuzzy_threshold(target.len());

        let mut matches: Vec<FuzzyMatch> = Vec::new();
        let mut seen_symbols: FxHashSet<SymbolRef> = FxHashSet::default();

        let mut current = owner;
        let mut seen_scopes: FxHashSet<SymbolRef> = FxHashSet::default();
        let mut depth = 0;
        while current.exists() && current != SymbolRef::TODO && depth < MAX_ANCESTRY_DEPTH {
            if !seen_scopes.insert(current) {
                break;
            }
            let data = self.symbol(current);
            let scopes = std::iter::once(current).chain(data.mixins.iter().copied());
            for scope in scopes {
                for (&member_name, &member) in &self.symbol(scope).members {
                    if member_name == name || !member.exists() || !seen_symbols.insert(member) {
                        continue;
                    }
                    let candidate = self.interner.lookup(member_name);
                    if candidate.len().abs_diff(target.len()) > threshold {
                        continue;
                    }
                    let distance = edit_distance(target, candidate);
                    if distance <= threshold {
                        matches.push(FuzzyMatch {
                            symbol: member,
                            distance,
                        });
                    }
                }
            }
            current = data.superclass;
            depth += 1;
        }

        matches.sort_by(|a, b| {
            a.distance.cmp(&b.distance).then_with(|| {
                self.interner
                    .lookup(self.symbol(a.symbol).name)
                    .cmp(self.interner.lookup(self.symbol(b.symbol).name))
            })
        });
        matches.truncate(max_results);
        matches
    }

    /// Follow class/method alias links to the ultimate non-alias target.
    pub fn dealias(&self, sym: SymbolRef) -> SymbolRef {
        let mut current = sym;
        for _ in 0..MAX_ANCESTRY_DEPTH {
            match &self.symbol(current).result_type {
                Some(Type::Alias(target)) if !self.symbol(current).is_type_alias() => {
                    current = *target;
                }
                _ => return current,
            }
        }
        current
    }

    /// Innermost class or module enclosing `sym` (including `sym` itself).
    pub fn enclosing_class(&self, sym: SymbolRef) -> SymbolRef {
        let mut current = sym;
        while current.exists() {
            let data = self.symbol(current);
            if data.is_class_or_module() {
                return current;
            }
            current = data.owner;
        }
        SymbolRef::ROOT
    }

    /// Whether `sym` has `parent` among its transitive ancestors.
    pub fn derives_from(&self, sym: SymbolRef, parent: SymbolRef) -> bool {
        let mut seen: FxHashSet<SymbolRef> = FxHashSet::default();
        let mut worklist: Vec<SymbolRef> = Vec::new();
        let data = self.symbol(sym);
        worklist.push(data.superclass);
        worklist.extend(data.mixins.iter().copied());

        while let Some(current) = worklist.pop() {
            if !current.exists() || current == SymbolRef::TODO {
                continue;
            }
            if current == parent {
                return true;
            }
            if !seen.insert(current) || seen.len() > MAX_ANCESTRY_DEPTH {
                continue;
            }
            let data = self.symbol(current);
            worklist.push(data.superclass);
            worklist.extend(data.mixins.iter().copied());
        }
        false
    }

    // ===== Predicates =====

    /// Class or module?
    pub fn is_class(&self, sym: SymbolRef) -> bool {
        sym.exists() && self.symbol(sym).is_class_or_module()
    }

    /// Module (as opposed to class)?
    pub fn is_class_module(&self, sym: SymbolRef) -> bool {
        sym.exists() && self.symbol(sym).kind == SymbolKind::Module
    }

    pub fn is_class_sealed(&self, sym: SymbolRef) -> bool {
        sym.exists() && self.symbol(sym).flags.contains(SymbolFlags::CLASS_SEALED)
    }

    pub fn is_class_abstract(&self, sym: SymbolRef) -> bool {
        sym.exists() && self.symbol(sym).flags.contains(SymbolFlags::CLASS_ABSTRACT)
    }

    pub fn is_class_interface(&self, sym: SymbolRef) -> bool {
        sym.exists() && self.symbol(sym).flags.contains(SymbolFlags::CLASS_INTERFACE)
    }

    pub fn is_singleton_class(&self, sym: SymbolRef) -> bool {
        sym.exists() && self.symbol(sym).flags.contains(SymbolFlags::CLASS_SINGLETON)
    }

    pub fn is_type_alias(&self, sym: SymbolRef) -> bool {
        sym.exists() && self.symbol(sym).is_type_alias()
    }

    pub fn is_type_member(&self, sym: SymbolRef) -> bool {
        sym.exists() && self.symbol(sym).kind == SymbolKind::TypeMember
    }

    pub fn is_static_field(&self, sym: SymbolRef) -> bool {
        sym.exists() && self.symbol(sym).kind == SymbolKind::StaticField
    }

    pub fn is_method(&self, sym: SymbolRef) -> bool {
        sym.exists() && self.symbol(sym).kind == SymbolKind::Method
    }

    // ===== Ancestry mutation =====

    /// Fill a class's superclass slot.
    pub fn set_super_class(&mut self, klass: SymbolRef, superclass: SymbolRef) {
        self.symbol_mut(klass).superclass = superclass;
    }

    /// Append a mixin to a class's mixin list.
    pub fn push_mixin(&mut self, klass: SymbolRef, mixin: SymbolRef) {
        self.symbol_mut(klass).mixins.push(mixin);
    }

    /// Record `subclass` on a sealed parent.
    pub fn record_sealed_subclass(&mut self, sealed: SymbolRef, subclass: SymbolRef) {
        let list = &mut self.symbol_mut(sealed).sealed_subclasses;
        if !list.contains(&subclass) {
            list.push(subclass);
        }
    }

    // ===== Symbol entry =====

    fn enter_member(
        &mut self,
        kind: SymbolKind,
        loc: Loc,
        owner: SymbolRef,
        name: Name,
    ) -> SymbolRef {
        if let Some(&existing) = self.symbol(owner).members.get(&name) {
            if self.symbol(existing).kind == kind {
                return existing;
            }
        }
        let sym = self.push_symbol(Symbol::new(kind, owner, name, loc));
        self.symbol_mut(owner).members.insert(name, sym);
        sym
    }

    /// Enter a class or module symbol (namer's entry point).
    pub fn enter_class_symbol(
        &mut self,
        loc: Loc,
        owner: SymbolRef,
        name: Name,
        is_module: bool,
    ) -> SymbolRef {
        let kind = if is_module {
            SymbolKind::Module
        } else {
            SymbolKind::Class
        };
        self.enter_member(kind, loc, owner, name)
    }

    /// Enter a method symbol.
    pub fn enter_method_symbol(&mut self, loc: Loc, owner: SymbolRef, name: Name) -> SymbolRef {
        self.enter_member(SymbolKind::Method, loc, owner, name)
    }

    /// Enter a constant symbol.
    pub fn enter_static_field_symbol(
        &mut self,
        loc: Loc,
        owner: SymbolRef,
        name: Name,
    ) -> SymbolRef {
        self.enter_member(SymbolKind::StaticField, loc, owner, name)
    }

    /// Enter an instance variable symbol.
    pub fn enter_field_symbol(&mut self, loc: Loc, owner: SymbolRef, name: Name) -> SymbolRef {
        self.enter_member(SymbolKind::Field, loc, owner, name)
    }

    /// Enter a type member symbol on a class.
    pub fn enter_type_member_symbol(
        &mut self,
        loc: Loc,
        owner: SymbolRef,
        name: Name,
    ) -> SymbolRef {
        let sym = self.enter_member(SymbolKind::TypeMember, loc, owner, name);
        if !self.symbol(owner).type_members.contains(&sym) {
            self.symbol_mut(owner).type_members.push(sym);
        }
        sym
    }

    /// Enter a per-method type variable.
    pub fn enter_type_argument(&mut self, loc: Loc, method: SymbolRef, name: Name) -> SymbolRef {
        self.enter_member(SymbolKind::TypeArgument, loc, method, name)
    }

    /// Mint a fresh name in a reserved namespace.
    pub fn fresh_name_unique(&self, kind: UniqueNameKind, base: Name, num: u32) -> Name {
        let base = self.interner.lookup(base);
        self.interner
            .intern(&format!("<{base}${}{num}>", kind.tag()))
    }

    /// Displace a symbol from its name slot so the slot can be re-entered.
    ///
    /// The symbol keeps existing under a fresh mangled name; lookups of the
    /// original name no longer find it.
    pub fn mangle_rename_symbol(&mut self, sym: SymbolRef, original_name: Name) {
        self.next_mangle += 1;
        let mangled = self.fresh_name_unique(UniqueNameKind::MangleRename, original_name, self.next_mangle);
        let owner = self.symbol(sym).owner;
        let owner_members = &mut self.symbol_mut(owner).members;
        if owner_members.get(&original_name) == Some(&sym) {
            owner_members.remove(&original_name);
        }
        owner_members.insert(mangled, sym);
        self.symbol_mut(sym).name = mangled;
    }

    /// Enter one overload of a method whose primary symbol was mangled away.
    ///
    /// The first overload re-enters under the original name; later ones get
    /// a reserved overload name. Only the argument positions in
    /// `args_to_keep` survive onto the overload symbol.
    pub fn enter_new_method_overload(
        &mut self,
        loc: Loc,
        original: SymbolRef,
        name: Name,
        num: u32,
        args_to_keep: &[usize],
    ) -> SymbolRef {
        let target_name = if num == 0 {
            name
        } else {
            self.fresh_name_unique(UniqueNameKind::Overload, name, num)
        };
        let owner = self.symbol(original).owner;
        let arguments: Vec<ArgInfo> = args_to_keep
            .iter()
            .map(|&i| self.symbol(original).arguments[i].clone())
            .collect();
        let sym = self.enter_member(SymbolKind::Method, loc, owner, target_name);
        self.symbol_mut(sym).arguments = arguments;
        sym
    }

    // ===== Singleton classes =====

    /// The singleton class of `klass`, if the namer created one.
    pub fn lookup_singleton_class(&self, klass: SymbolRef) -> SymbolRef {
        self.find_member(klass, self.names.singleton)
    }

    /// The singleton class of `klass`, created on first use.
    pub fn singleton_class(&mut self, klass: SymbolRef) -> SymbolRef {
        let existing = self.lookup_singleton_class(klass);
        if existing.exists() {
            return existing;
        }
        let loc = self.symbol(klass).loc;
        let name = self.names.singleton;
        let singleton = self.enter_member(SymbolKind::Class, loc, klass, name);
        self.symbol_mut(singleton)
            .flags
            .insert(SymbolFlags::CLASS_SINGLETON);
        self.symbol_mut(singleton).superclass = SymbolRef::OBJECT;
        singleton
    }

    // ===== Rendering =====

    /// Render a symbol as `Outer::Inner::Name` for messages.
    pub fn show_full_name(&self, sym: SymbolRef) -> String {
        if !sym.exists() {
            return "<none>".to_string();
        }
        let mut parts: Vec<&str> = Vec::new();
        let mut current = sym;
        while current.exists() && current != SymbolRef::ROOT {
            let data = self.symbol(current);
            parts.push(self.interner.lookup(data.name));
            if data.owner == current {
                break;
            }
            current = data.owner;
        }
        parts.reverse();
        parts.join("::")
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Edit-distance threshold scaled to the length of the unknown name.
fn fuzzy_threshold(name_len: usize) -> usize {
    match name_len {
        0 => 0,
        1..=2 => 1,
        3..=5 => 2,
        6..=10 => 3,
        n => (n / 2).min(5),
    }
}

/// Levenshtein edit distance, two-row formulation.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut prev_row: Vec<usize> = (0..=b_len).collect();
    let mut curr_row: Vec<usize> = vec![0; b_len + 1];

    for (i, a_char) in a.chars().enumerate() {
        curr_row[0] = i + 1;
        for (j, b_char) in b.chars().enumerate() {
            let cost = usize::from(a_char != b_char);
            curr_row[j + 1] = (prev_row[j + 1] + 1)
                .min(curr_row[j] + 1)
                .min(prev_row[j] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b_len]
}

#[cfg(test)]
mod edit_distance_tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("Hello", "Hello"), 0);
        assert_eq!(edit_distance("Helo", "Hello"), 1);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }
}
