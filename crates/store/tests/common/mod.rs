// Path: crates/store/tests/common/mod.rs
#![allow(dead_code)]

//! A miniature WordNet-style database written to a temp directory.
//!
//! Data files carry real byte offsets so direct-offset access works, the
//! adjective file has a head/satellite cluster, and every data and index
//! file starts with a license header announcing `WordNet 3.0`.

use lexdb_types::{LexConfig, LoadPolicy};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

pub const HEADER: &str = "  1 This software and database is being provided to you, the LICENSEE, by\n  2 Princeton University under the following license.  WordNet 3.0 Copyright 2006 by Princeton University.\n";

/// Installs a test subscriber once; respects `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One synset to lay out in a data file.
pub struct Synset {
    pub name: &'static str,
    pub lex_file: u8,
    pub tag: char,
    pub words: Vec<(&'static str, u8)>,
    /// Symbol, target synset name, target tag.
    pub pointers: Vec<(&'static str, &'static str, char)>,
    pub frames: Option<&'static str>,
    pub gloss: &'static str,
}

fn render(s: &Synset, offset: usize, offsets: &BTreeMap<&'static str, u32>) -> String {
    let mut line = format!("{:08} {:02} {} {:02x}", offset, s.lex_file, s.tag, s.words.len());
    for (word, lex_id) in &s.words {
        line.push_str(&format!(" {word} {lex_id:x}"));
    }
    line.push_str(&format!(" {:03}", s.pointers.len()));
    for (symbol, target, tag) in &s.pointers {
        let target = offsets.get(target).copied().unwrap_or(0);
        line.push_str(&format!(" {symbol} {target:08} {tag} 0000"));
    }
    if let Some(frames) = s.frames {
        line.push(' ');
        line.push_str(frames);
    }
    line.push_str(&format!(" | {}  \n", s.gloss));
    line
}

/// Lays out a data file. Every field is fixed width, so line lengths do not
/// depend on the offsets they carry.
pub fn data_file(synsets: &[Synset]) -> (String, BTreeMap<&'static str, u32>) {
    let mut offsets = BTreeMap::new();
    let mut position = HEADER.len();
    for s in synsets {
        offsets.insert(s.name, position as u32);
        position += render(s, 0, &BTreeMap::new()).len();
    }
    let mut text = HEADER.to_string();
    for s in synsets {
        text.push_str(&render(s, offsets[s.name] as usize, &offsets));
    }
    (text, offsets)
}

/// Renders a sorted index file.
pub fn index_file(tag: char, entries: &[(&str, &[&str], &[u32])]) -> String {
    let mut sorted: Vec<_> = entries.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let mut text = HEADER.to_string();
    for (lemma, symbols, offsets) in sorted {
        let mut fields = vec![
            lemma.to_string(),
            tag.to_string(),
            offsets.len().to_string(),
            symbols.len().to_string(),
        ];
        fields.extend(symbols.iter().map(|s| s.to_string()));
        fields.push(offsets.len().to_string());
        fields.push("1".to_string());
        fields.extend(offsets.iter().map(|o| format!("{o:08}")));
        text.push_str(&fields.join(" "));
        text.push_str("  \n");
    }
    text
}

pub struct Fixture {
    pub dir: TempDir,
    /// Synset offsets keyed by (category tag, synset name).
    pub offsets: BTreeMap<(char, &'static str), u32>,
}

impl Fixture {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn offset(&self, tag: char, name: &str) -> u32 {
        *self
            .offsets
            .iter()
            .find(|((t, n), _)| *t == tag && *n == name)
            .map(|(_, o)| o)
            .unwrap_or_else(|| panic!("no synset {tag}:{name}"))
    }

    /// Configuration with the cache on and no automatic loading.
    pub fn config(&self) -> LexConfig {
        let mut config = LexConfig::new(self.path());
        config.load_policy = LoadPolicy::NoLoad;
        config
    }

    pub fn write(&self, name: &str, text: &str) {
        fs::write(self.path().join(name), text).unwrap();
    }
}

fn synset(
    name: &'static str,
    lex_file: u8,
    tag: char,
    words: Vec<(&'static str, u8)>,
    pointers: Vec<(&'static str, &'static str, char)>,
    gloss: &'static str,
) -> Synset {
    Synset {
        name,
        lex_file,
        tag,
        words,
        pointers,
        frames: None,
        gloss,
    }
}

/// The miniature database.
pub fn wordnet() -> Fixture {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let fixture = Fixture {
        dir,
        offsets: BTreeMap::new(),
    };
    let mut offsets = BTreeMap::new();

    let (noun, noun_offsets) = data_file(&[
        synset("entity", 3, 'n', vec![("entity", 0)], vec![("~", "canine", 'n')], "that which is perceived to have its own distinct existence"),
        synset("canine", 5, 'n', vec![("canine", 0)], vec![("@", "entity", 'n'), ("~", "dog", 'n')], "any of various fissiped mammals"),
        synset("dog", 5, 'n', vec![("dog", 0), ("domestic_dog", 0)], vec![("@", "canine", 'n')], "a member of the genus Canis"),
        synset("cat", 5, 'n', vec![("cat", 0)], vec![], "feline mammal usually having thick soft fur"),
    ]);
    fixture.write("data.noun", &noun);
    let o = |name: &str| noun_offsets[name];
    fixture.write(
        "index.noun",
        &index_file(
            'n',
            &[
                ("canine", &["@", "~"], &[o("canine")]),
                ("cat", &[], &[o("cat")]),
                ("dog", &["@"], &[o("dog")]),
                ("domestic_dog", &["@"], &[o("dog")]),
                ("entity", &["~"], &[o("entity")]),
            ],
        ),
    );
    fixture.write("noun.exc", "geese goose\nmice mouse\n");
    offsets.extend(noun_offsets.iter().map(|(n, o)| (('n', *n), *o)));

    let mut run = synset("run", 38, 'v', vec![("run", 0)], vec![], "move fast by using one's feet");
    run.frames = Some("01 + 02 00");
    let (verb, verb_offsets) = data_file(&[run]);
    fixture.write("data.verb", &verb);
    fixture.write("index.verb", &index_file('v', &[("run", &[], &[verb_offsets["run"]])]));
    fixture.write("verb.exc", "ran run\n");
    offsets.extend(verb_offsets.iter().map(|(n, o)| (('v', *n), *o)));

    let (adj, adj_offsets) = data_file(&[
        synset("fast", 0, 'a', vec![("fast", 1)], vec![("&", "swift", 's')], "acting or moving or capable of acting or moving quickly"),
        synset("swift", 0, 's', vec![("swift", 0), ("speedy", 0)], vec![("&", "fast", 'a')], "moving very fast"),
    ]);
    fixture.write("data.adj", &adj);
    fixture.write(
        "index.adj",
        &index_file(
            'a',
            &[
                ("fast", &["&"], &[adj_offsets["fast"]]),
                ("speedy", &["&"], &[adj_offsets["swift"]]),
                ("swift", &["&"], &[adj_offsets["swift"]]),
            ],
        ),
    );
    fixture.write("adj.exc", "faster fast\n");
    offsets.extend(adj_offsets.iter().map(|(n, o)| (('a', *n), *o)));

    let (adv, adv_offsets) = data_file(&[synset("quickly", 2, 'r', vec![("quickly", 0)], vec![], "with speed")]);
    fixture.write("data.adv", &adv);
    fixture.write("index.adv", &index_file('r', &[("quickly", &[], &[adv_offsets["quickly"]])]));
    offsets.extend(adv_offsets.iter().map(|(n, o)| (('r', *n), *o)));

    let mut senses = vec![
        format!("canine%1:05:00:: {:08} 1 0", noun_offsets["canine"]),
        format!("cat%1:05:00:: {:08} 1 0", noun_offsets["cat"]),
        format!("dog%1:05:00:: {:08} 1 42", noun_offsets["dog"]),
        format!("domestic_dog%1:05:00:: {:08} 1 0", noun_offsets["dog"]),
        format!("entity%1:03:00:: {:08} 1 11", noun_offsets["entity"]),
        format!("fast%3:00:01:: {:08} 1 5", adj_offsets["fast"]),
        format!("quickly%4:02:00:: {:08} 1 3", adv_offsets["quickly"]),
        format!("run%2:38:00:: {:08} 1 20", verb_offsets["run"]),
        format!("speedy%5:00:00:fast:01 {:08} 1 0", adj_offsets["swift"]),
        format!("swift%5:00:00:fast:01 {:08} 1 2", adj_offsets["swift"]),
    ];
    senses.sort();
    fixture.write("index.sense", &(senses.join("\n") + "\n"));

    Fixture { offsets, ..fixture }
}

/// A noun data file with `n` single-word synsets `w00000`, `w00001`, ...
pub fn bulk(n: usize) -> Fixture {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let mut text = HEADER.to_string();
    for i in 0..n {
        let offset = text.len();
        text.push_str(&format!("{offset:08} 05 n 01 w{i:05} 0 000 | entry number {i}  \n"));
    }
    let fixture = Fixture {
        dir,
        offsets: BTreeMap::new(),
    };
    fixture.write("data.noun", &text);
    fixture
}

/// The lemma of the single word in each bulk synset, in file order.
pub fn bulk_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("w{i:05}")).collect()
}
