use super::*;
use crate::document::StyledSpan;
use proptest::prelude::*;

fn markup_block(text: &str, markers: usize) -> Block {
    let hint = if markers == 0 {
        StructureHint::None
    } else {
        StructureHint::HeadingMarker(markers)
    };
    Block::new(vec![StyledSpan::plain(text)], hint)
}

fn styled_block(text: &str, style: Option<&str>) -> Block {
    Block::new(
        vec![StyledSpan::plain(text)],
        StructureHint::Style(style.map(String::from)),
    )
}

fn roles_of(doc: &Document) -> Vec<Roles> {
    classify(doc, &FormatRules::default())
        .into_iter()
        .map(|c| c.roles)
        .collect()
}

#[test]
fn test_first_and_last_are_unique() {
    let doc = Document::new(
        SourceKind::Markup,
        vec![
            Block::empty(),
            markup_block("Title", 0),
            markup_block("middle", 0),
            Block::empty(),
            markup_block("closing", 0),
            Block::empty(),
        ],
    );
    let roles = roles_of(&doc);
    assert_eq!(roles.iter().filter(|r| r.first_line).count(), 1);
    assert_eq!(roles.iter().filter(|r| r.last_line).count(), 1);
    assert!(roles[1].first_line);
    assert!(roles[4].last_line);
    assert!(!roles[0].first_line && !roles[5].last_line);
}

#[test]
fn test_single_block_has_both_positional_roles() {
    let doc = Document::new(SourceKind::PlainText, vec![Block::from_text("Only line")]);
    let roles = roles_of(&doc);
    assert_eq!(roles[0].to_vec(), vec![Role::Body, Role::FirstLine, Role::LastLine]);
}

#[test]
fn test_blank_document_has_no_positional_roles() {
    let doc = Document::new(SourceKind::Markup, vec![Block::empty(), Block::from_text("  ")]);
    assert!(roles_of(&doc).iter().all(|r| *r == Roles::default()));
}

#[test]
fn test_markup_heading_levels() {
    let doc = Document::new(
        SourceKind::Markup,
        vec![
            markup_block("one", 1),
            markup_block("six", 6),
            markup_block("seven", 7),
        ],
    );
    let roles = roles_of(&doc);
    assert!(roles[0].contains(Role::Heading(HeadingLevel::new(1).unwrap())));
    assert!(roles[1].contains(Role::Heading(HeadingLevel::new(6).unwrap())));
    assert!(roles[2].contains(Role::Body));
    assert!(roles.iter().all(|r| r.heading.is_none_or(|h| (1..=6).contains(&h.level.get()))));
}

#[test]
fn test_section_keyword_in_markup_is_inferred() {
    let doc = Document::new(
        SourceKind::Markup,
        vec![
            markup_block("Intro", 0),
            markup_block("Técnica do exame: helicoidal.", 0),
            markup_block("## Impressão:", 2),
        ],
    );
    let roles = roles_of(&doc);
    assert_eq!(
        roles[1].heading,
        Some(Heading { level: HeadingLevel::new(1).unwrap(), origin: HeadingOrigin::Inferred })
    );
    // explicit markers take precedence over keywords
    assert!(roles[2].heading.unwrap().is_declared());
}

#[test]
fn test_colon_heading_only_in_plain_text() {
    let plain = Document::new(SourceKind::PlainText, vec![Block::from_text("Conclusão:")]);
    assert_eq!(
        roles_of(&plain)[0].heading.map(|h| h.origin),
        Some(HeadingOrigin::Inferred)
    );

    let markup = Document::new(SourceKind::Markup, vec![markup_block("Conclusão:", 0)]);
    assert_eq!(roles_of(&markup)[0].heading, None);
}

#[test]
fn test_colon_heading_can_be_disabled() {
    let rules = FormatRules {
        colon_headings: false,
        ..Default::default()
    };
    let doc = Document::new(SourceKind::PlainText, vec![Block::from_text("Conclusão:")]);
    assert_eq!(classify(&doc, &rules)[0].roles.heading, None);
}

#[test]
fn test_rich_style_mapping() {
    let doc = Document::new(
        SourceKind::RichDocument,
        vec![
            styled_block("Exam", Some("Title")),
            styled_block("Section", Some("Heading2")),
            styled_block("Body", Some("Normal")),
            styled_block("Odd", Some("Fancy Quote")),
            styled_block("Impressão: normal", None),
        ],
    );
    let roles = roles_of(&doc);
    assert_eq!(roles[0].heading.map(|h| h.level.get()), Some(1));
    assert_eq!(roles[1].heading.map(|h| h.level.get()), Some(2));
    assert!(roles[1].heading.unwrap().is_declared());
    assert_eq!(roles[2].heading, None);
    assert_eq!(roles[3].heading, None);
    // keywords are not consulted for rich documents
    assert_eq!(roles[4].heading, None);
}

#[test]
fn test_findings_impression_plain_text() {
    let doc = Document::new(
        SourceKind::PlainText,
        vec![
            Block::from_text("Findings: clear."),
            Block::from_text("Impression: normal."),
        ],
    );
    let roles = roles_of(&doc);
    assert!(roles[0].first_line && !roles[0].last_line);
    assert!(roles[1].last_line && !roles[1].first_line);
    assert!(roles.iter().all(|r| r.heading.is_some_and(|h| !h.is_declared())));
}

#[test]
fn test_role_order() {
    let doc = Document::new(SourceKind::Markup, vec![markup_block("Technique", 1)]);
    let roles = roles_of(&doc);
    assert_eq!(
        roles[0].to_vec(),
        vec![
            Role::Heading(HeadingLevel::new(1).unwrap()),
            Role::FirstLine,
            Role::LastLine
        ]
    );
}

fn any_source() -> impl Strategy<Value = SourceKind> {
    prop_oneof![
        Just(SourceKind::RichDocument),
        Just(SourceKind::Markup),
        Just(SourceKind::PlainText),
    ]
}

fn any_block() -> impl Strategy<Value = Block> {
    let hint = prop_oneof![
        Just(StructureHint::None),
        (0usize..10).prop_map(StructureHint::HeadingMarker),
        prop::option::of("Title|Heading ?[0-9]|Normal|Fancy Quote").prop_map(StructureHint::Style),
    ];
    ("[a-zA-Zçã: ]{0,12}", hint).prop_map(|(text, hint)| Block::new(vec![StyledSpan::plain(text)], hint))
}

proptest! {
    #[test]
    fn test_positional_roles_appear_once(
        source in any_source(),
        blocks in prop::collection::vec(any_block(), 0..12),
    ) {
        let doc = Document::new(source, blocks);
        let expected = usize::from(doc.blocks.iter().any(|b| !b.is_blank()));
        let roles = roles_of(&doc);
        prop_assert_eq!(roles.iter().filter(|r| r.first_line).count(), expected);
        prop_assert_eq!(roles.iter().filter(|r| r.last_line).count(), expected);
    }

    #[test]
    fn test_heading_levels_stay_in_range(
        source in any_source(),
        blocks in prop::collection::vec(any_block(), 0..12),
    ) {
        let doc = Document::new(source, blocks);
        for (block, roles) in doc.blocks.iter().zip(roles_of(&doc)) {
            if let Some(heading) = roles.heading {
                prop_assert!((1..=6).contains(&heading.level.get()));
                prop_assert!(!block.is_blank());
            }
        }
    }
}
