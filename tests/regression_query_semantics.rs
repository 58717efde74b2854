use element_query::{Capabilities, Dom, QueryEngine};

fn engines() -> Vec<QueryEngine> {
    vec![
        QueryEngine::new(Capabilities::full()),
        QueryEngine::new(Capabilities::xpath_only()),
        QueryEngine::new(Capabilities::manual_only()),
    ]
}

#[test]
fn class_query_rejects_substring_tokens() -> element_query::Result<()> {
    let dom = Dom::from_html(
        r#"<div id="root"><p class="a b" id="p">x</p><span class="ab">y</span></div>"#,
    )?;
    let root = dom.by_id("root").unwrap();
    let p = dom.by_id("p").unwrap();

    for engine in engines() {
        let hits = engine.elements_by_class(&dom, root, "a")?;
        assert_eq!(hits, vec![p], "tier {:?}", engine.tier());
    }
    Ok(())
}

#[test]
fn attribute_query_rejects_concatenated_tokens() -> element_query::Result<()> {
    let dom = Dom::from_html(
        r#"
        <div id="root">
          <p data-tag="x" id="hit-x">1</p>
          <p data-tag="y" id="hit-y">2</p>
          <p data-tag="xy">3</p>
        </div>
        "#,
    )?;
    let root = dom.by_id("root").unwrap();
    let expected = vec![dom.by_id("hit-x").unwrap(), dom.by_id("hit-y").unwrap()];

    for engine in engines() {
        let hits = engine.elements_by_attribute(&dom, root, "data-tag", "x y")?;
        assert_eq!(hits, expected, "tier {:?}", engine.tier());
    }
    Ok(())
}

#[test]
fn ancestor_search_finds_container_from_leaf() -> element_query::Result<()> {
    let dom = Dom::from_html(
        r#"
        <body>
          <div class="container">
            <span>
              <b id="leaf">x</b>
            </span>
          </div>
        </body>
        "#,
    )?;
    let leaf = dom.by_id("leaf").unwrap();

    let container = dom.find_ancestor_by_class(leaf, "container").unwrap();
    assert_eq!(dom.tag_name(container), Some("div"));
    assert!(dom.has_class(container, "container"));
    Ok(())
}

#[test]
fn ancestor_search_does_not_cross_the_body_boundary() -> element_query::Result<()> {
    let dom = Dom::from_html(
        r#"<html class="page"><body><div><i id="leaf">x</i></div></body></html>"#,
    )?;
    let leaf = dom.by_id("leaf").unwrap();

    assert_eq!(dom.find_ancestor_by_class(leaf, "page"), None);
    Ok(())
}

#[test]
fn add_then_query_round_trip_across_tiers() -> element_query::Result<()> {
    let mut dom = Dom::from_html(
        r#"<div id="root"><p id="a">1</p><p id="b">2</p><p id="c">3</p></div>"#,
    )?;
    let root = dom.by_id("root").unwrap();
    let a = dom.by_id("a").unwrap();
    let c = dom.by_id("c").unwrap();

    dom.add_class(a, "picked");
    dom.add_class(c, "picked");
    dom.add_class(c, "picked");

    for engine in engines() {
        let hits = engine.elements_by_class(&dom, root, "picked")?;
        assert_eq!(hits, vec![a, c], "tier {:?}", engine.tier());
    }

    dom.remove_class(a, "picked");
    for engine in engines() {
        let hits = engine.elements_by_class(&dom, root, "picked")?;
        assert_eq!(hits, vec![c], "tier {:?}", engine.tier());
    }
    Ok(())
}

#[test]
fn deeply_nested_matches_keep_document_order() -> element_query::Result<()> {
    let dom = Dom::from_html(
        r#"
        <div id="root">
          <div class="hit" id="n1">
            <div>
              <div class="hit" id="n2"></div>
            </div>
            <div class="hit" id="n3"></div>
          </div>
          <div class="hit" id="n4"></div>
        </div>
        "#,
    )?;
    let root = dom.by_id("root").unwrap();
    let expected = ["n1", "n2", "n3", "n4"]
        .iter()
        .map(|id| dom.by_id(id).unwrap())
        .collect::<Vec<_>>();

    for engine in engines() {
        let hits = engine.elements_by_class(&dom, root, "hit")?;
        assert_eq!(hits, expected, "tier {:?}", engine.tier());
    }
    Ok(())
}

#[test]
fn queries_on_an_empty_subtree_return_empty() -> element_query::Result<()> {
    let dom = Dom::from_html(r#"<div id="root"></div>"#)?;
    let root = dom.by_id("root").unwrap();

    for engine in engines() {
        assert!(engine.elements_by_class(&dom, root, "any")?.is_empty());
        assert!(engine
            .elements_by_attribute(&dom, root, "data-tag", "any")?
            .is_empty());
    }
    Ok(())
}
