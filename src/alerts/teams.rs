//! Team name localisation for outgoing messages.

use std::collections::HashMap;

use crate::config::Locale;

/// NBA team names in Traditional Chinese (Taiwan usage).
const NBA_ZH_TW: &[(&str, &str)] = &[
    ("Atlanta Hawks", "老鷹"),
    ("Boston Celtics", "塞爾提克"),
    ("Brooklyn Nets", "籃網"),
    ("Charlotte Hornets", "黃蜂"),
    ("Chicago Bulls", "公牛"),
    ("Cleveland Cavaliers", "騎士"),
    ("Dallas Mavericks", "獨行俠"),
    ("Denver Nuggets", "金塊"),
    ("Detroit Pistons", "活塞"),
    ("Golden State Warriors", "勇士"),
    ("Houston Rockets", "火箭"),
    ("Indiana Pacers", "溜馬"),
    ("Los Angeles Clippers", "快艇"),
    ("Los Angeles Lakers", "湖人"),
    ("Memphis Grizzlies", "灰熊"),
    ("Miami Heat", "熱火"),
    ("Milwaukee Bucks", "公鹿"),
    ("Minnesota Timberwolves", "灰狼"),
    ("New Orleans Pelicans", "鵜鶘"),
    ("New York Knicks", "尼克"),
    ("Oklahoma City Thunder", "雷霆"),
    ("Orlando Magic", "魔術"),
    ("Philadelphia 76ers", "七六人"),
    ("Phoenix Suns", "太陽"),
    ("Portland Trail Blazers", "拓荒者"),
    ("Sacramento Kings", "國王"),
    ("San Antonio Spurs", "馬刺"),
    ("Toronto Raptors", "暴龍"),
    ("Utah Jazz", "爵士"),
    ("Washington Wizards", "巫師"),
];

/// Maps provider team names to display names. Unknown names pass through.
#[derive(Debug, Clone, Default)]
pub struct TeamNames {
    names: HashMap<String, String>,
}

impl TeamNames {
    pub fn new(locale: Locale, overrides: &HashMap<String, String>) -> Self {
        let mut names: HashMap<String, String> = match locale {
            Locale::English => HashMap::new(),
            Locale::TraditionalChinese => NBA_ZH_TW
                .iter()
                .map(|(en, zh)| (en.to_string(), zh.to_string()))
                .collect(),
        };
        names.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { names }
    }

    pub fn display<'a>(&'a self, name: &'a str) -> &'a str {
        self.names.get(name).map(String::as_str).unwrap_or(name)
    }
}
