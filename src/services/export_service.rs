use opml::{Outline, OPML};

use crate::errors::{RelayError, RelayResult};

/// Render subscribed sources as OPML, in index order
pub fn export_opml(sources: &[String]) -> RelayResult<String> {
    let mut opml = OPML::default();
    opml.head = Some(opml::Head {
        title: Some("Feed Relay Subscriptions".to_string()),
        ..Default::default()
    });

    for (index, url) in sources.iter().enumerate() {
        let outline = Outline {
            text: format!("{} {}", index, url),
            r#type: Some("rss".to_string()),
            xml_url: Some(url.clone()),
            ..Default::default()
        };
        opml.body.outlines.push(outline);
    }

    opml.to_string().map_err(|e| RelayError::Opml(e.to_string()))
}
