use html::collect::{collect_script_texts, collect_style_texts};
use html::traverse::{ancestors, descendants, elements_named};
use html::{Document, NodeId, outer_html, parse_document, to_html};
use html_test_support::assert_text_eq;

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Cards &amp; lists</title>
  <link rel="stylesheet" href="css/main.css">
  <style>.card > h2 { margin: 0; }</style>
</head>
<body>
  <!-- hero -->
  <main class="page">
    <div class="card" data-id="1">
      <h2 id="t1" class="title">Old</h2>
      <p title="a &quot;quoted&quot; title">x &lt; y</p>
      <img src="a.png" alt="">
      <input disabled>
    </div>
  </main>
  <script>if (a < b && c > d) { document.write("</div>"); }</script>
</body>
</html>"#;

fn attached_nodes_are_consistent(doc: &Document) {
    for id in descendants(doc, doc.root()) {
        for &child in doc.children(id) {
            assert_eq!(doc.parent(child), Some(id), "{child} has the wrong parent");
            let seen = doc.children(id).iter().filter(|c| **c == child).count();
            assert_eq!(seen, 1, "{child} listed {seen} times under {id}");
        }
    }
}

#[test]
fn serialization_is_stable_after_one_pass() {
    let once = to_html(&parse_document(PAGE));
    let twice = to_html(&parse_document(&once));
    assert_text_eq("reserialized page", &once, &twice);
    assert!(once.starts_with("<!DOCTYPE html>\n<html lang=\"en\">"));
}

#[test]
fn entities_and_raw_text_survive() {
    let doc = parse_document(PAGE);
    let html = to_html(&doc);
    assert!(html.contains("<title>Cards &amp; lists</title>"));
    assert!(html.contains(r#"<p title="a &quot;quoted&quot; title">x &lt; y</p>"#));
    assert!(html.contains(r#"<img src="a.png" alt="">"#));
    assert!(html.contains("<input disabled>\n"));
    assert_eq!(
        collect_script_texts(&doc),
        [r#"if (a < b && c > d) { document.write("</div>"); }"#]
    );
    assert_eq!(collect_style_texts(&doc), [".card > h2 { margin: 0; }"]);
}

#[test]
fn named_references_survive_a_subtree_replacement() {
    let page = "<footer><p id=\"c\">&copy; 2024 &mdash; ACME&nbsp;Inc &laquo;x&raquo;</p>\
                <a href=\"?a=1&copy=2\" title=\"a&nbsp;b\">q</a><h2>old</h2></footer>";
    let mut doc = parse_document(page);
    let h2 = elements_named(&doc, "h2").next().unwrap();
    doc.replace_with_fragment(h2, &parse_document("<h2>new</h2>")).unwrap();
    let html = to_html(&doc);

    assert!(!html.contains("&amp;copy;"), "{html}");
    assert!(!html.contains("&amp;mdash;"), "{html}");
    assert!(
        html.contains("<p id=\"c\">\u{A9} 2024 \u{2014} ACME&nbsp;Inc \u{AB}x\u{BB}</p>"),
        "{html}"
    );
    assert!(html.contains(r#"<a href="?a=1&amp;copy=2" title="a&nbsp;b">q</a>"#), "{html}");
    assert!(html.contains("<h2>new</h2>"));
    assert_text_eq("second pass", &html, &to_html(&parse_document(&html)));
}

#[test]
fn ancestors_walk_to_the_root() {
    let doc = parse_document(PAGE);
    let h2 = elements_named(&doc, "h2").next().unwrap();
    let names: Vec<_> = ancestors(&doc, h2)
        .map(|id| doc.element_name(id).unwrap_or("#document"))
        .collect();
    assert_eq!(names, ["div", "main", "body", "html", "#document"]);
}

#[test]
fn subtree_replacement_keeps_the_tree_consistent() {
    let mut doc = parse_document(PAGE);
    let h2 = elements_named(&doc, "h2").next().unwrap();
    let card = doc.parent(h2).unwrap();
    let before = doc.children(card).len();

    let replacement = parse_document("<h2 id=\"t1\" class=\"title\" style=\"color:green\">Old</h2><hr>");
    let inserted = doc.replace_with_fragment(h2, &replacement).unwrap();

    assert_eq!(inserted.len(), 2);
    assert_eq!(doc.children(card).len(), before + 1);
    assert!(!doc.is_attached(h2));
    assert!(inserted.iter().all(|id| doc.is_attached(*id)));
    attached_nodes_are_consistent(&doc);

    let new_h2: NodeId = elements_named(&doc, "h2").next().unwrap();
    assert_eq!(
        outer_html(&doc, new_h2),
        r#"<h2 id="t1" class="title" style="color:green">Old</h2>"#
    );
}

#[test]
fn repeated_replacement_does_not_leak_into_the_tree() {
    let mut doc = parse_document("<ul><li id=\"x\">0</li></ul>");
    for i in 1..=50 {
        let li = elements_named(&doc, "li").next().unwrap();
        let replacement = parse_document(&format!("<li id=\"x\">{i}</li>"));
        doc.replace_with_fragment(li, &replacement).unwrap();
    }
    assert_eq!(to_html(&doc), "<ul><li id=\"x\">50</li></ul>");
    assert_eq!(elements_named(&doc, "li").count(), 1);
    attached_nodes_are_consistent(&doc);
}
