/// A schematic with one resistor, a wire, a junction and a note.
pub fn resistor_schematic(libraries: &[&str]) -> String {
    let libs: String = libraries.iter().map(|l| format!("LIBS:{l}\n")).collect();
    format!(
        "EESchema Schematic File Version 2\n\
{libs}EELAYER 25 0\n\
EELAYER END\n\
$Descr A4 11693 8268\n\
encoding utf-8\n\
Sheet 1 1\n\
Title \"Fixture\"\n\
$EndDescr\n\
Wire Wire Line\n\
\t4500 2850 4500 2500\n\
Connection ~ 4500 2500\n\
Text Notes 4000 2000 0 60 ~ 0\n\
Bias resistor\n\
$Comp\n\
L Device:R R1\n\
U 1 1 5A0B1C2D\n\
P 4500 3000\n\
F 0 \"R1\" V 4580 3000 50  0000 C CNN\n\
F 1 \"10k\" V 4500 3000 50  0000 C CNN\n\
\t1    4500 3000\n\
\t1    0    0    -1  \n\
$EndComp\n\
$EndSCHEMATC\n"
    )
}

pub const DEVICE_LIB: &str = "EESchema-LIBRARY Version 2.3\n\
#encoding utf-8\n\
#\n\
# R\n\
#\n\
DEF R R 0 0 N Y 1 F N\n\
F0 \"R\" 80 0 50 V V C CNN\n\
DRAW\n\
S -40 -100 40 100 0 1 10 N\n\
X ~ 1 0 150 50 D 50 50 1 1 P\n\
X ~ 2 0 -150 50 U 50 50 1 1 P\n\
ENDDRAW\n\
ENDDEF\n\
#\n\
#End Library\n";
