//! Markup shared by the integration tests.

pub const NOTE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<note>
  <to>Tove</to>
  <from>Jani</from>
  <heading>Reminder</heading>
  <body>Don't forget me this weekend!</body>
</note>"#;

pub const NOTE_NAMESPACED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<note xmlns="http://my-example-namespace">
  <to>Tove</to>
  <from>Jani</from>
  <heading>Reminder</heading>
  <body>Don't forget me this weekend!</body>
</note>"#;

pub const HELLOWORLD_HTML: &str = r#"<html>
  <head><title>Hello World</title></head>
  <body>
    <h1 class="title">Hello World</h1>
    <img class="image square" src="helloworld.jpg"/>
    <p>Hello <b>World</b></p>
  </body>
</html>"#;

pub const HELLOWORLD_XHTML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
  <head><title>Hello World</title></head>
  <body>
    <img class="image square" src="helloworld.jpg"/>
    <p>Hello World</p>
  </body>
</html>"#;

pub const CONTRIB: &str = r#"<nlm:contrib xmlns:nlm="http://schema.highwire.org/NLM/Journal" nlm:contrib-type="author"><nlm:string-name nlm:test="teststring">Patrick Douglas Hayes</nlm:string-name></nlm:contrib>"#;

pub const ATOM_AUTHOR: &str = r#"<?xml version="1.0"?><!-- This is a comment -->
<atom:author test="123" xmlns:atom="http://www.w3.org/2005/Atom" xmlns:nlm="http://schema.highwire.org/NLM/Journal" xmlns:hwp="http://schema.highwire.org/Journal" nlm:contrib-type="author">
  <atom:name>Shubhayan Sanatani</atom:name>
  <nlm:name name-style="western" hwp:sortable="Sanatani Shubhayan"><nlm:surname>Sanatani</nlm:surname><nlm:given-names>Shubhayan</nlm:given-names></nlm:name>
  <nlm:name name-style="eastern" hwp:sortable="Li Xu"><nlm:surname>Li</nlm:surname><nlm:given-names>Xu</nlm:given-names></nlm:name>
</atom:author>"#;

pub const SEARCH_RESULTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<hwsearch:results xmlns:hwsearch="http://schema.highwire.org/Search"
   query-uuid="d7a5cf55-b5ea-4031-8014-3aa66600a4ba" total-result-count="10405356" first-result="1">
    <hwsearch:result index="1">
        <hwsearch:atom-uri>/jbc/288/4/2261.atom</hwsearch:atom-uri>
        <hwsearch:highwire-id>jbc;M112.411033</hwsearch:highwire-id>
        <hwsearch:pubmed-id>pmid;23212921</hwsearch:pubmed-id>
        <hwsearch:georef-id/>
        <hwsearch:kwic/>
        <hwsearch:highwire-title>Test Title</hwsearch:highwire-title>
    </hwsearch:result>
    <hwsearch:result index="2">
        <hwsearch:atom-uri>/jbc/288/4/2290.atom</hwsearch:atom-uri>
        <hwsearch:highwire-id>jbc;M112.417337</hwsearch:highwire-id>
        <hwsearch:pubmed-id>pmid;23209297</hwsearch:pubmed-id>
        <hwsearch:georef-id/>
        <hwsearch:kwic/>
        <hwsearch:highwire-title>Structural Determinants of Ubiquitin Conjugation</hwsearch:highwire-title>
    </hwsearch:result>
</hwsearch:results>"#;

/// A default-namespaced document for context and prefix-repair checks.
pub const DEFAULT_NAMESPACED: &str = r#"<catalog xmlns="http://example.com/ns" xmlns:x="urn:extra">
  <shelf id="a"><book>One</book><book x:rating="5">Two</book></shelf>
  <shelf id="b"><book>Three</book></shelf>
</catalog>"#;

pub const LISTS: &str = r#"<html>
  <body>
    <div id="main" class="foo bar"><p class="x">First</p></div>
    <span id="main">Second</span>
    <div class="foobar"><p id="other">Third</p></div>
    <ul><li>direct</li><ol><li>nested</li></ol></ul>
  </body>
</html>"#;
