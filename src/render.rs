//! Reply renderer
//!
//! Maps a [`Message`] to a small view tree that any front end can draw. The
//! mapping is pure: same message in, same bubble out.

use crate::offers::RECOMMENDED_NOTE;
use crate::state::{Content, FlightOffer, Message, Role};

pub const SPONSORED_BADGE: &str = "Sponsored";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Bordered bubble, used for the user
    Outlined,
    /// Shaded bubble, used for the assistant
    Filled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Border {
    Plain,
    Highlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget {
    /// Open outside the chat, in a fresh browsing context
    NewContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRel {
    NoOpener,
    NoReferrer,
}

/// Outbound link to a merchant page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub target: LinkTarget,
    pub rel: [LinkRel; 2],
}

impl Link {
    pub fn outbound(href: &str) -> Self {
        Self {
            href: href.to_string(),
            target: LinkTarget::NewContext,
            rel: [LinkRel::NoOpener, LinkRel::NoReferrer],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferCard {
    pub link: Link,
    pub title: String,
    pub border: Border,
    pub badge: Option<&'static str>,
    pub note: Option<&'static str>,
    pub details: [(&'static str, String); 4],
}

impl OfferCard {
    pub fn is_sponsored(&self) -> bool {
        self.badge.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Text(String),
    Offers {
        heading: Vec<String>,
        cards: Vec<OfferCard>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub align: Align,
    pub tone: Tone,
    pub body: Body,
}

pub fn card(offer: &FlightOffer) -> OfferCard {
    OfferCard {
        link: Link::outbound(&offer.merchant_url),
        title: format!("{} – {}", offer.airline, offer.code),
        border: if offer.sponsored { Border::Highlight } else { Border::Plain },
        badge: offer.sponsored.then_some(SPONSORED_BADGE),
        note: offer.recommended.then_some(RECOMMENDED_NOTE),
        details: [
            ("Departure", offer.departure.clone()),
            ("Arrival", offer.arrival.clone()),
            ("Duration", offer.duration.clone()),
            ("Price", offer.price.clone()),
        ],
    }
}

pub fn bubble(message: &Message) -> Bubble {
    let (align, tone) = match message.role() {
        Role::User => (Align::Right, Tone::Outlined),
        Role::Assistant => (Align::Left, Tone::Filled),
    };

    let body = match message.content() {
        Content::Text(text) => Body::Text(text.clone()),
        Content::Offers(list) => Body::Offers {
            heading: list.heading.clone(),
            cards: list.offers.iter().map(card).collect(),
        },
    };

    Bubble { align, tone, body }
}

/// Number of offer cards a message renders
pub fn cards_in(message: &Message) -> usize {
    match message.content() {
        Content::Offers(list) => list.offers.len(),
        Content::Text(_) => 0,
    }
}

/// Outbound link of the `idx`-th card in a message, if there is one
pub fn card_link(message: &Message, idx: usize) -> Option<Link> {
    match message.content() {
        Content::Offers(list) => list.offers.get(idx).map(|o| Link::outbound(&o.merchant_url)),
        Content::Text(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{MessageId, OfferList};

    fn msg(role: Role, content: Content) -> Message {
        Message::new(MessageId(1), role, content)
    }

    #[test]
    fn test_text_alignment_by_role() {
        let user = bubble(&msg(Role::User, Content::Text("hi".into())));
        let ai = bubble(&msg(Role::Assistant, Content::Text("hello".into())));
        assert_eq!(user.align, Align::Right);
        assert_eq!(user.tone, Tone::Outlined);
        assert_eq!(ai.align, Align::Left);
        assert_eq!(ai.body, Body::Text("hello".into()));
    }

    #[test]
    fn test_only_first_card_is_sponsored() {
        let message = msg(Role::Assistant, Content::Offers(OfferList::builtin()));
        let Body::Offers { cards, .. } = bubble(&message).body else {
            panic!("expected offers body");
        };
        let flags: Vec<bool> = cards.iter().map(OfferCard::is_sponsored).collect();
        assert_eq!(flags, vec![true, false, false]);
        assert_eq!(cards[0].border, Border::Highlight);
        assert_eq!(cards[1].border, Border::Plain);
    }

    #[test]
    fn test_cards_keep_supplied_order() {
        let mut list = OfferList::builtin();
        list.offers.reverse();
        let message = msg(Role::Assistant, Content::Offers(list));
        let Body::Offers { cards, .. } = bubble(&message).body else {
            panic!("expected offers body");
        };
        let titles: Vec<&str> = cards.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Qatar Airways – QR 012", "British Airways – BA 107", "APEX Airways – AX 004"]
        );
    }

    #[test]
    fn test_recommended_and_sponsored_are_independent() {
        let mut offer = OfferList::builtin().offers.remove(1);
        offer.recommended = true;
        let c = card(&offer);
        assert_eq!(c.note, Some(RECOMMENDED_NOTE));
        assert_eq!(c.badge, None);
        assert_eq!(c.details[3], ("Price", "£545 (Economy)".to_string()));
    }

    #[test]
    fn test_links_open_in_new_context_without_referrer() {
        let link = Link::outbound("https://www.britishairways.com/");
        assert_eq!(link.target, LinkTarget::NewContext);
        assert!(link.rel.contains(&LinkRel::NoReferrer));
        assert!(link.rel.contains(&LinkRel::NoOpener));
    }

    #[test]
    fn test_card_helpers() {
        let offers = msg(Role::Assistant, Content::Offers(OfferList::builtin()));
        let text = msg(Role::User, Content::Text("hi".into()));
        assert_eq!(cards_in(&offers), 3);
        assert_eq!(cards_in(&text), 0);
        assert_eq!(
            card_link(&offers, 2).map(|l| l.href),
            Some("https://www.qatarairways.com/".to_string())
        );
        assert!(card_link(&offers, 3).is_none());
        assert!(card_link(&text, 0).is_none());
    }
}
