use crate::taxonomy::loader::parse_taxonomy;
use crate::taxonomy::{Taxonomy, TaxonomyBuilder};

/// Builds a small animal/vehicle taxonomy with WordNet-like sense names.
fn fixture() -> Taxonomy {
    let mut builder = TaxonomyBuilder::new();
    let senses: &[(&str, &[&str])] = &[
        ("entity.n.01", &[]),
        ("physical_entity.n.01", &["entity.n.01"]),
        ("object.n.01", &["physical_entity.n.01"]),
        ("living_thing.n.01", &["object.n.01"]),
        ("organism.n.01", &["living_thing.n.01"]),
        ("animal.n.01", &["organism.n.01"]),
        ("vertebrate.n.01", &["animal.n.01"]),
        ("mammal.n.01", &["vertebrate.n.01"]),
        ("carnivore.n.01", &["mammal.n.01"]),
        ("canine.n.02", &["carnivore.n.01"]),
        ("dog.n.01", &["canine.n.02"]),
        ("wolf.n.01", &["canine.n.02"]),
        ("feline.n.01", &["carnivore.n.01"]),
        ("cat.n.01", &["feline.n.01"]),
        ("artifact.n.01", &["object.n.01"]),
        ("instrumentality.n.03", &["artifact.n.01"]),
        ("conveyance.n.03", &["instrumentality.n.03"]),
        ("vehicle.n.01", &["conveyance.n.03"]),
        ("wheeled_vehicle.n.01", &["vehicle.n.01"]),
        ("motor_vehicle.n.01", &["wheeled_vehicle.n.01"]),
        ("car.n.01", &["motor_vehicle.n.01"]),
        ("truck.n.01", &["motor_vehicle.n.01"]),
        ("bicycle.n.01", &["wheeled_vehicle.n.01"]),
    ];
    for (name, parents) in senses {
        builder.add_sense(name, parents).unwrap();
    }
    let lemmas: &[(&str, &[&str])] = &[
        ("dog", &["dog.n.01"]),
        ("wolf", &["wolf.n.01"]),
        ("cat", &["cat.n.01"]),
        ("car", &["car.n.01"]),
        ("truck", &["truck.n.01"]),
        ("bicycle", &["bicycle.n.01"]),
    ];
    for (word, senses) in lemmas {
        builder.add_lemma(word, senses).unwrap();
    }
    builder.build().unwrap()
}

#[test]
fn test_depths_count_from_root() {
    let taxonomy = fixture();
    let dog = taxonomy.senses_of("dog")[0];
    assert_eq!(taxonomy.depth(dog), 11);
    let car = taxonomy.senses_of("car")[0];
    assert_eq!(taxonomy.depth(car), 10);
}

#[test]
fn test_senses_of_unknown_word_is_empty() {
    let taxonomy = fixture();
    assert!(taxonomy.senses_of("qwxyz123").is_empty());
}

#[test]
fn test_hypernym_closure_includes_self_and_all_ancestors() {
    let taxonomy = fixture();
    let dog = taxonomy.senses_of("dog")[0];
    let closure = taxonomy.hypernym_closure(dog);
    // dog.n.01 up to entity.n.01, one node per level
    assert_eq!(closure.len(), 11);
    assert!(closure.contains(&dog));
    let names: Vec<&str> = closure.iter().map(|&s| taxonomy.sense_name(s)).collect();
    assert!(names.contains(&"carnivore.n.01"));
    assert!(names.contains(&"entity.n.01"));
    assert!(!names.contains(&"feline.n.01"));
}

#[test]
fn test_wup_similarity_identical_senses() {
    let taxonomy = fixture();
    let dog = taxonomy.senses_of("dog")[0];
    assert_eq!(taxonomy.wup_similarity(dog, dog), 1.0);
}

#[test]
fn test_wup_similarity_known_value() {
    let taxonomy = fixture();
    let dog = taxonomy.senses_of("dog")[0];
    let cat = taxonomy.senses_of("cat")[0];
    // LCS is carnivore.n.01 at depth 9; both senses are at depth 11
    let expected = 2.0 * 9.0 / 22.0;
    assert!((taxonomy.wup_similarity(dog, cat) - expected).abs() < 1e-12);
    // Symmetric
    assert_eq!(
        taxonomy.wup_similarity(dog, cat),
        taxonomy.wup_similarity(cat, dog)
    );
}

#[test]
fn test_wup_similarity_closer_pair_scores_higher() {
    let taxonomy = fixture();
    let dog = taxonomy.senses_of("dog")[0];
    let wolf = taxonomy.senses_of("wolf")[0];
    let car = taxonomy.senses_of("car")[0];
    assert!(taxonomy.wup_similarity(dog, wolf) > taxonomy.wup_similarity(dog, car));
}

#[test]
fn test_wup_similarity_disjoint_roots() {
    let mut builder = TaxonomyBuilder::new();
    builder.add_sense("a.n.01", &[]).unwrap();
    builder.add_sense("b.n.01", &[]).unwrap();
    builder.add_lemma("a", &["a.n.01"]).unwrap();
    builder.add_lemma("b", &["b.n.01"]).unwrap();
    let taxonomy = builder.build().unwrap();
    let a = taxonomy.senses_of("a")[0];
    let b = taxonomy.senses_of("b")[0];
    assert_eq!(taxonomy.wup_similarity(a, b), 0.0);
}

#[test]
fn test_term_strips_sense_suffix() {
    let taxonomy = fixture();
    let dog = taxonomy.senses_of("dog")[0];
    assert_eq!(taxonomy.term(dog), "dog");
}

#[test]
fn test_builder_rejects_duplicate_sense() {
    let mut builder = TaxonomyBuilder::new();
    builder.add_sense("a.n.01", &[]).unwrap();
    assert!(builder.add_sense("a.n.01", &[]).is_err());
}

#[test]
fn test_builder_rejects_unknown_parent() {
    let mut builder = TaxonomyBuilder::new();
    builder.add_sense("a.n.01", &["missing.n.01"]).unwrap();
    assert!(builder.build().is_err());
}

#[test]
fn test_builder_rejects_duplicate_lemma() {
    let mut builder = TaxonomyBuilder::new();
    builder.add_sense("a.n.01", &[]).unwrap();
    builder.add_sense("b.n.01", &[]).unwrap();
    builder.add_lemma("word", &["a.n.01"]).unwrap();
    builder.add_lemma("word", &["b.n.01"]).unwrap();
    assert!(builder.build().is_err());
}

#[test]
fn test_builder_rejects_cycle() {
    let mut builder = TaxonomyBuilder::new();
    builder.add_sense("a.n.01", &["b.n.01"]).unwrap();
    builder.add_sense("b.n.01", &["a.n.01"]).unwrap();
    assert!(builder.build().is_err());
}

#[test]
fn test_parse_taxonomy_dump() {
    let dump = "\
# tiny fixture
S\tentity.n.01\t
S\tanimal.n.01\tentity.n.01
S\tdog.n.01\tanimal.n.01
L\tdog\tdog.n.01
";
    let taxonomy = parse_taxonomy(dump).unwrap();
    assert_eq!(taxonomy.len(), 3);
    let dog = taxonomy.senses_of("dog")[0];
    assert_eq!(taxonomy.depth(dog), 3);
}

#[test]
fn test_parse_taxonomy_rejects_unknown_record_kind() {
    assert!(parse_taxonomy("X\tfoo\t\n").is_err());
}

#[test]
fn test_multiple_parents_use_deepest_for_depth() {
    let mut builder = TaxonomyBuilder::new();
    builder.add_sense("root.n.01", &[]).unwrap();
    builder.add_sense("mid.n.01", &["root.n.01"]).unwrap();
    builder
        .add_sense("leaf.n.01", &["root.n.01", "mid.n.01"])
        .unwrap();
    builder.add_lemma("leaf", &["leaf.n.01"]).unwrap();
    let taxonomy = builder.build().unwrap();
    let leaf = taxonomy.senses_of("leaf")[0];
    assert_eq!(taxonomy.depth(leaf), 3);
}
