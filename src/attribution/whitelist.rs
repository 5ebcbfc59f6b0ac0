//! Known referrer sources.
//!
//! Sources outside this set are rewritten to `(other)` during validation
//! rather than rejected. The list is sorted so membership is a binary
//! search.

const SOURCE_WHITELIST: &[&str] = &[
    "accounts.firefox.com",
    "activations.cdn.mozilla.net",
    "addons.mozilla.org",
    "allizom.org",
    "answers.yahoo.com",
    "ar.search.yahoo.com",
    "at.search.yahoo.com",
    "au.search.yahoo.com",
    "bienvenido.toshiba.com",
    "bing.com",
    "br.answers.yahoo.com",
    "br.search.yahoo.com",
    "br.yhs4.search.yahoo.com",
    "ca.search.yahoo.com",
    "ch.search.yahoo.com",
    "cl.search.yahoo.com",
    "cn.bing.com",
    "co.search.yahoo.com",
    "co.yhs4.search.yahoo.com",
    "cto.mail.ru",
    "de.search.yahoo.com",
    "developer.mozilla.org",
    "dk.search.yahoo.com",
    "e.mail.ru",
    "email.seznam.cz",
    "en-maktoob.search.yahoo.com",
    "encrypted.google.com",
    "es-mg42.mail.yahoo.com",
    "es.search.yahoo.com",
    "espanol.search.yahoo.com",
    "extensions.aol.com",
    "facebook.com",
    "fi.search.yahoo.com",
    "firefox-browser",
    "firefox-com",
    "firefox.cz",
    "firefox.de",
    "firefox.mozilla.cz",
    "firefox.no",
    "firefox.org",
    "firefox.si",
    "fr-mg42.mail.yahoo.com",
    "fr.search.yahoo.com",
    "fr.yhs4.search.yahoo.com",
    "getfirefox-com",
    "global.bing.com",
    "go.mail.ru",
    "gr.search.yahoo.com",
    "hacks.mozilla.org",
    "hangouts.google.com",
    "hello.firefox.com",
    "help.ea.com",
    "help.mail.ru",
    "hk.messenger.yahoo.com",
    "hk.search.yahoo.com",
    "id.messenger.yahoo.com",
    "id.search.yahoo.com",
    "id.yhs4.search.yahoo.com",
    "images.tanks.mail.ru",
    "in.search.yahoo.com",
    "in.yhs4.search.yahoo.com",
    "it.search.yahoo.com",
    "kongregate.com",
    "lite.qwant.com",
    "love.mail.ru",
    "mail.aol.com",
    "mail.de",
    "mail.google.com",
    "mail.ru",
    "maktoob.search.yahoo.com",
    "malaysia.search.yahoo.com",
    "malaysia.yhs4.search.yahoo.com",
    "messenger.yahoo.com",
    "mg.mail.yahoo.com",
    "mozilla.ch",
    "mozilla.com",
    "mozilla.cz",
    "mozilla.de",
    "mozilla.ee",
    "mozilla.fi",
    "mozilla.hu",
    "mozilla.jp",
    "mozilla.lt",
    "mozilla.pl",
    "mozilla.ro",
    "mozilla.rs",
    "mozilla.si",
    "mozilla.sk",
    "mx.search.yahoo.com",
    "mx.yhs4.search.yahoo.com",
    "my.mail.ru",
    "myaccount.google.com",
    "navigator-bs.gmx.com",
    "navigator-bs.gmx.es",
    "navigator-bs.gmx.fr",
    "nl.search.yahoo.com",
    "no.search.yahoo.com",
    "nz.search.yahoo.com",
    "otvet.mail.ru",
    "partnerads.ysm.yahoo.com",
    "pe.search.yahoo.com",
    "ph.search.yahoo.com",
    "photos.google.com",
    "pl.search.yahoo.com",
    "plus.google.com",
    "plus.url.google.com",
    "poseidon.navigator-bs.gmx.com",
    "qc.search.yahoo.com",
    "ro.search.yahoo.com",
    "ru.search.yahoo.com",
    "scholar.google.com",
    "se.search.yahoo.com",
    "se.yhs4.search.yahoo.com",
    "search.1and1.com",
    "sg.search.yahoo.com",
    "start.new.toshiba.com",
    "start.toshiba.com",
    "suche.gmx.at",
    "suche.gmx.net",
    "support.google.com",
    "support.mozilla.org",
    "takeout.google.com",
    "talkgadget.google.com",
    "tanks.mail.ru",
    "taobao.com",
    "testpilot.firefox.com",
    "th.search.yahoo.com",
    "thunderbird.mozilla.cz",
    "tr.search.yahoo.com",
    "tw.search.yahoo.com",
    "tweetdeck.twitter.com",
    "uk.search.yahoo.com",
    "uk.yhs4.search.yahoo.com",
    "us-mg5.mail.yahoo.com",
    "us-mg6.mail.yahoo.com",
    "us.search.yahoo.com",
    "us.yhs4.search.yahoo.com",
    "ve.search.yahoo.com",
    "vn.search.yahoo.com",
    "www.aol.com",
    "www.bing.com",
    "www.google.be",
    "www.google.bg",
    "www.google.ca",
    "www.google.com",
    "www.google.de",
    "www.google.dz",
    "www.google.es",
    "www.google.fr",
    "www.google.it",
    "www.google.pl",
    "www.google.ro",
    "www.google.se",
    "www.google.sr",
    "www.qwant.com",
    "www.seznam.cz",
    "www.yahoo.com",
    "www.youtube.com",
    "youtube.com",
];

/// Whether `source` is a known referrer.
#[must_use]
pub fn is_whitelisted(source: &str) -> bool {
    SOURCE_WHITELIST.binary_search(&source).is_ok()
}
