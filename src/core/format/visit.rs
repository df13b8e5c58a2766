//! Visit and cookie projections of the visitor session

use crate::adapters::source::SessionProvider;
use crate::domain::{Cookies, Visit};

/// Cookie carrying the vendor's visit id
pub const VISIT_COOKIE: &str = "jirafe_vid";

/// Cookie carrying the vendor's visitor id
pub const VISITOR_COOKIE: &str = "jirafe_vis";

fn cookie_or_empty(session: &dyn SessionProvider, name: &str) -> String {
    session.cookie(name).unwrap_or_default()
}

/// Current visit identifiers; page view ids are never tracked server-side
pub fn format_visit(session: &dyn SessionProvider) -> Visit {
    Visit {
        visit_id: cookie_or_empty(session, VISIT_COOKIE),
        visitor_id: cookie_or_empty(session, VISITOR_COOKIE),
        pageview_id: String::new(),
        last_pageview_id: String::new(),
    }
}

/// Projection of the vendor cookies
pub fn format_cookies(session: &dyn SessionProvider) -> Cookies {
    Cookies {
        jirafe_ratr: cookie_or_empty(session, "jirafe_ratr"),
        jirafe_lnd: cookie_or_empty(session, "jirafe_lnd"),
        jirafe_ref: cookie_or_empty(session, "jirafe_ref"),
        jirafe_vis: cookie_or_empty(session, "jirafe_vis"),
        jirafe_reftyp: cookie_or_empty(session, "jirafe_reftyp"),
        jirafe_typ: cookie_or_empty(session, "jirafe_typ"),
        jirafe_vid: cookie_or_empty(session, "jirafe_vid"),
    }
}
