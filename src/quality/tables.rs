// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Historical periods of degraded or missing SCIAMACHY data, most recent
//! first. Entries are only ever appended.

use super::Period;

const fn p(start: i32, end: i32) -> Period {
    Period { start, end }
}

/// Decontamination periods.
pub(super) const DECONTAMINATION: &[Period] = &[
    p(35574, 35848),
    p(14676, 14897),
    p(12031, 12208),
    p(9407, 9673),
    p(7574, 7827),
    p(6384, 6449),
    p(5718, 5766),
    p(4204, 4428),
];

/// Recovery after a decontamination or an instrument switch-off.
pub(super) const RECOVERY: &[Period] = &[
    p(52219, 52225),
    p(51788, 51802),
    p(51687, 51693),
    p(50021, 50027),
    p(49820, 49826),
    p(49633, 49639),
    p(49072, 49080),
    p(48325, 48336),
    p(47567, 47589),
    p(47393, 47404),
    p(45641, 45653),
    p(45396, 45408),
    p(44968, 44979),
    p(44351, 44357),
    p(44148, 44154),
    p(42476, 42488),
    p(41887, 41899),
    p(41733, 41738),
    p(41430, 41442),
    p(41201, 41212),
    p(40371, 40383),
    p(38938, 38944),
    p(38230, 38236),
    p(38153, 38165),
    p(37980, 37992),
    p(36664, 36678),
    p(34906, 34911),
    p(33890, 33903),
    p(30264, 30278),
    p(30136, 30150),
    p(29165, 29189),
    p(28318, 28329),
    p(27873, 27874),
    p(25073, 25081),
    p(24844, 24857),
    p(24754, 24760),
    p(23698, 23717),
    p(22163, 22170),
    p(21634, 21640),
    p(21547, 21552),
    p(21477, 21498),
    p(20605, 20619),
    p(20588, 20600),
    p(16739, 16755),
    p(16686, 16690),
    p(14898, 14912),
    p(14217, 14232),
    p(13546, 13559),
    p(13430, 13443),
    p(12286, 12303),
    p(11471, 11482),
    p(9883, 9899),
    p(9685, 9698),
    p(9239, 9253),
    p(7954, 7964),
    p(5516, 5527),
    p(5477, 5491),
    p(5136, 5152),
    p(5073, 5086),
    p(4457, 4479),
    p(4187, 4199),
    p(4110, 4122),
    p(3990, 4002),
    p(3958, 3970),
    p(3788, 3809),
    p(2781, 2793),
    p(2596, 2608),
    p(1969, 1981),
    p(1564, 1576),
    p(1511, 1524),
    p(1455, 1476),
    p(1285, 1306),
    p(1195, 1207),
    p(1080, 1092),
    p(868, 880),
    p(634, 646),
];

/// Periods without usable data.
pub(super) const UNAVAILABLE: &[Period] = &[
    p(52313, 52318),
    p(52204, 52219),
    p(51772, 51788),
    p(51670, 51687),
    p(50003, 50021),
    p(49800, 49820),
    p(49800, 49820),
    p(49620, 49633),
    p(49034, 49072),
    p(48302, 48325),
    p(47540, 47567),
    p(47370, 47393),
    p(45619, 45641),
    p(45379, 45396),
    p(45188, 45261),
    p(44953, 44968),
    p(44364, 44368),
    p(44340, 44351),
    p(44135, 44148),
    p(43643, 43647),
    p(42640, 42645),
    p(42462, 42476),
    p(41867, 41887),
    p(41722, 41733),
    p(41638, 41643),
    p(41409, 41430),
    p(41186, 41201),
    p(40636, 40641),
    p(40355, 40371),
    p(39634, 39639),
    p(38911, 38938),
    p(38632, 38637),
    p(38216, 38230),
    p(38131, 38153),
    p(37959, 37980),
    p(37130, 37137),
    p(36647, 36664),
    p(36126, 36134),
    p(35819, 35834),
    p(35125, 35133),
    p(34894, 34906),
    p(34123, 34131),
    p(33870, 33890),
    p(33121, 33129),
    p(32119, 32127),
    p(31117, 31125),
    p(30249, 30264),
    p(30076, 30136),
    p(29107, 29165),
    p(28304, 28318),
    p(28111, 28119),
    p(27856, 27873),
    p(27297, 27299),
    p(26609, 26616),
    p(25607, 25614),
    p(25182, 25183),
    p(25016, 25073),
    p(24810, 24844),
    p(24740, 24754),
    p(23717, 23725),
    p(23641, 23697),
    p(22177, 22181),
    p(22167, 22172),
    p(22139, 22163),
    p(21584, 21634),
    p(21534, 21547),
    p(21428, 21479),
    p(21298, 21306),
    p(20590, 20606),
    p(20570, 20588),
    p(20196, 20204),
    p(18409, 18415),
    p(16716, 16739),
    p(16675, 16686),
    p(15916, 15924),
    p(14930, 14936),
    p(14882, 14898),
    p(14198, 14217),
    p(13526, 13546),
    p(13410, 13430),
    p(13384, 13393),
    p(12269, 12286),
    p(11449, 11471),
    p(11094, 11100),
    p(10092, 10098),
    p(9867, 9883),
    p(9667, 9685),
    p(9439, 9482),
    p(9412, 9426),
    p(9193, 9239),
    p(8675, 8684),
    p(8082, 8083),
    p(7793, 7794),
    p(7634, 7664),
    p(7309, 7363),
    p(6344, 6382),
    p(5502, 5516),
    p(5426, 5477),
    p(5099, 5136),
    p(5034, 5073),
    p(4429, 4457),
    p(4180, 4187),
    p(4169, 4178),
    p(4093, 4110),
    p(3982, 3990),
    p(3925, 3958),
    p(3752, 3788),
    p(3643, 3696),
    p(2737, 2781),
    p(2586, 2596),
    p(1952, 1969),
    p(1550, 1564),
    p(1488, 1511),
    p(1483, 1488),
    p(1385, 1455),
    p(1245, 1285),
    p(1238, 1245),
    p(1113, 1195),
    p(1022, 1080),
    p(842, 868),
    p(627, 634),
];
